//! Plain-text views of portal data.

use std::fmt::Write as _;

use eid_models::{
    format_address, format_login_date, format_time_ago, Identity, MemberNote, RosterMember,
    TribeName, VoiceAccountCredentials, VoiceAccountStatus,
};

/// Profile, tribes and linked wallets. `explorer` turns an address into a
/// block-explorer link.
pub fn identity(me: &Identity, current_tribe: Option<&TribeName>, explorer: impl Fn(&str) -> String) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} (discord {})", me.username, me.discord_id);
    let _ = writeln!(out, "last login: {}", format_login_date(me.last_login_at));

    let role = if me.is_super_admin {
        "super admin"
    } else if me.is_admin {
        "admin"
    } else if !me.admin_tribes.is_empty() {
        "tribe admin"
    } else {
        "member"
    };
    let _ = writeln!(out, "role: {role}");

    let tribes: Vec<String> = me
        .tribes
        .iter()
        .map(|t| {
            let mut label = t.to_string();
            if me.admin_tribes.contains(t) {
                label.push_str(" (admin)");
            }
            if current_tribe == Some(t) {
                label.push_str(" *");
            }
            label
        })
        .collect();
    if tribes.is_empty() {
        let _ = writeln!(out, "tribes: none");
    } else {
        let _ = writeln!(out, "tribes: {}", tribes.join(", "));
    }

    if me.wallets.is_empty() {
        let _ = writeln!(out, "wallets: none linked");
    }
    for w in &me.wallets {
        let _ = writeln!(
            out,
            "wallet {} {} [{}] verified {}\n  {}",
            w.id,
            format_address(w.address.as_str()),
            w.network(),
            format_time_ago(w.verified_at),
            explorer(w.address.as_str()),
        );
    }
    out
}

/// One line per member, removed wallets flagged.
pub fn roster(members: &[RosterMember]) -> String {
    if members.is_empty() {
        return "no members\n".to_string();
    }

    let mut out = String::new();
    for m in members {
        let _ = writeln!(
            out,
            "{:<24} {:>2} wallet(s)  last login {}",
            m.username,
            m.active_wallets().count(),
            format_login_date(m.last_login_at),
        );
        for w in &m.wallets {
            match w.deleted_at {
                Some(at) => {
                    let _ = writeln!(out, "    {} (removed {})", format_address(w.address.as_str()), format_time_ago(at));
                }
                None => {
                    let _ = writeln!(out, "    {}", format_address(w.address.as_str()));
                }
            }
        }
    }
    out
}

/// Member detail: profile, every wallet, the audit page and any notes.
pub fn member(m: &RosterMember, notes: &[MemberNote]) -> String {
    let mut out = roster(std::slice::from_ref(m));
    let _ = writeln!(out, "discord id: {}", m.discord_id);

    if let Some(audits) = &m.audits {
        let _ = writeln!(
            out,
            "activity (page {} of {}, {} entries):",
            audits.page,
            audits.total_pages.max(1),
            audits.total
        );
        for a in &audits.items {
            let _ = writeln!(
                out,
                "  {:<14} {:<16} by {} {}",
                a.action,
                a.details,
                a.actor_username,
                format_time_ago(a.created_at)
            );
        }
    }

    for n in notes {
        let _ = writeln!(
            out,
            "note by {} {}:\n  {}",
            n.author_username,
            format_time_ago(n.created_at),
            n.content
        );
    }
    out
}

pub fn voice_status(status: &VoiceAccountStatus, server: &str) -> String {
    match &status.username {
        Some(name) => format!("voice account: {name} on {server}\n"),
        None => "no voice account yet; run `eid voice create`\n".to_string(),
    }
}

/// The password is only shown once, so say so.
pub fn voice_credentials(creds: &VoiceAccountCredentials, server: &str) -> String {
    format!(
        "server:   {server}\nusername: {}\npassword: {}\nThe password is not shown again.\n",
        creds.username, creds.password
    )
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use eid_models::{AuditEntry, AuditPage, LinkedWallet, RosterWallet, WalletId};

    use super::*;

    fn member() -> Identity {
        Identity {
            id: "1".to_string(),
            discord_id: "42".to_string(),
            username: "ember".to_string(),
            discriminator: "0".to_string(),
            avatar: None,
            tribes: vec![TribeName::new("Fire"), TribeName::new("Water")],
            admin_tribes: vec![TribeName::new("Fire")],
            is_admin: false,
            is_super_admin: false,
            last_login_at: None,
            wallets: Vec::new(),
        }
    }

    #[test]
    fn identity_marks_admin_and_current_tribe() {
        let out = identity(&member(), Some(&TribeName::new("Fire")), |a| a.to_string());
        assert!(out.contains("role: tribe admin"));
        assert!(out.contains("tribes: Fire (admin) *, Water"));
        assert!(out.contains("last login: Never"));
        assert!(out.contains("wallets: none linked"));
    }

    #[test]
    fn identity_lists_wallets_with_links() {
        let mut me = member();
        me.wallets.push(LinkedWallet {
            id: WalletId::new("w1"),
            address: "0xabc".into(),
            verified_at: Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap(),
            network: None,
            tribes: Vec::new(),
        });
        let out = identity(&me, None, |a| format!("https://explorer/{a}"));
        assert!(out.contains("wallet w1"));
        assert!(out.contains("[mainnet]"));
        assert!(out.contains("https://explorer/0xabc"));
    }

    #[test]
    fn roster_flags_removed_wallets() {
        let members = vec![RosterMember {
            discord_id: "42".to_string(),
            username: "ember".to_string(),
            avatar: None,
            last_login_at: None,
            wallets: vec![
                RosterWallet {
                    id: WalletId::new("w1"),
                    address: "0xabc".into(),
                    deleted_at: None,
                    tribes: Vec::new(),
                },
                RosterWallet {
                    id: WalletId::new("w2"),
                    address: "0xdef".into(),
                    deleted_at: Some(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()),
                    tribes: Vec::new(),
                },
            ],
            audits: None,
        }];
        let out = roster(&members);
        assert!(out.contains(" 1 wallet(s)"));
        assert!(out.contains("(removed "));
        assert_eq!(roster(&[]), "no members\n");
    }

    #[test]
    fn member_lists_activity_and_notes() {
        let at = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();
        let m = RosterMember {
            discord_id: "42".to_string(),
            username: "ash".to_string(),
            avatar: None,
            last_login_at: None,
            wallets: Vec::new(),
            audits: Some(AuditPage {
                items: vec![AuditEntry {
                    id: "a1".to_string(),
                    action: "WALLET_LINK".to_string(),
                    actor_id: "2".to_string(),
                    target_id: None,
                    details: "Linked wallet 0x1".to_string(),
                    created_at: at,
                    actor_username: "ash".to_string(),
                    actor_discriminator: "0".to_string(),
                }],
                total: 1,
                page: 1,
                per_page: 10,
                total_pages: 1,
            }),
        };
        let note = MemberNote {
            id: "n1".to_string(),
            target_user_id: "2".to_string(),
            author_id: "1".to_string(),
            tribe: TribeName::new("Fire"),
            content: "Asked about voice access".to_string(),
            created_at: at,
            updated_at: at,
            author_username: "ember".to_string(),
            author_discriminator: "0".to_string(),
        };

        let out = super::member(&m, &[note]);
        assert!(out.contains("discord id: 42"));
        assert!(out.contains("activity (page 1 of 1, 1 entries):"));
        assert!(out.contains("WALLET_LINK"));
        assert!(out.contains("note by ember"));
        assert!(out.contains("  Asked about voice access"));
    }

    #[test]
    fn voice_views() {
        let none = VoiceAccountStatus { username: None };
        assert!(voice_status(&none, "voice.example").contains("eid voice create"));

        let creds = VoiceAccountCredentials {
            username: "ember".to_string(),
            password: "0123456789abcdef".to_string(),
        };
        let out = voice_credentials(&creds, "voice.example");
        assert!(out.contains("password: 0123456789abcdef"));
        assert!(out.contains("server:   voice.example"));
    }
}
