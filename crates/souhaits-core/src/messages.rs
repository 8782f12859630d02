//! Message texts.

/// Subject and body of a notification, before addressing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub subject: String,
    pub body: String,
}

/// Link that resolves `token`.
pub fn challenge_link(base_url: &str, token: &str) -> String {
    format!("{}/challenge/{token}", base_url.trim_end_matches('/'))
}

fn with_reminder(mut body: String, reminder: Option<&str>) -> String {
    if let Some(link) = reminder {
        body.push_str(&format!(
            "\nPS: you can log in to your lists at any time with this link:\n  {link}\n"
        ));
    }
    body
}

fn bullet_list(lines: impl IntoIterator<Item = impl AsRef<str>>) -> String {
    lines
        .into_iter()
        .map(|l| format!("  - {}\n", l.as_ref()))
        .collect()
}

pub fn challenge(site_name: &str, link: &str) -> Message {
    Message {
        subject: format!("{site_name}: please confirm your email address"),
        body: format!(
            "Hello,\n\n\
             To confirm your email address and access your wishlists, open:\n  {link}\n\n\
             Keep this message: the same link logs you in again later.\n\n\
             If you did not ask for this, ignore this message.\n"
        ),
    }
}

pub fn item_deleted(list_name: &str, title: &str, reminder: Option<&str>) -> Message {
    Message {
        subject: format!("A wish you reserved was removed from \"{list_name}\""),
        body: with_reminder(
            format!(
                "Hello,\n\n\
                 The owner of the list \"{list_name}\" removed the wish \"{title}\",\n\
                 which you had reserved. Your reservation is cancelled.\n"
            ),
            reminder,
        ),
    }
}

pub fn list_destroyed(list_name: &str, titles: &[String], reminder: Option<&str>) -> Message {
    Message {
        subject: format!("The list \"{list_name}\" was deleted"),
        body: with_reminder(
            format!(
                "Hello,\n\n\
                 The list \"{list_name}\" has been deleted by its owner.\n\
                 You had reserved the following wishes:\n{}",
                bullet_list(titles)
            ),
            reminder,
        ),
    }
}

pub fn donated(giver: &str, title: &str, item_link: &str, reminder: Option<&str>) -> Message {
    Message {
        subject: format!("\"{title}\" has been given"),
        body: with_reminder(
            format!(
                "Hello,\n\n\
                 {giver} says the wish \"{title}\" has been given to you.\n\
                 It will disappear from your list in a few weeks.\n\n\
                 If you did not receive it, or want it again, edit it here:\n  {item_link}\n"
            ),
            reminder,
        ),
    }
}

pub fn invitation(
    inviter_name: &str,
    list_names: &[String],
    link: &str,
    personal_message: &str,
) -> Message {
    let mut body = format!("Hello,\n\n{inviter_name} invites you to see their wishlists:\n");
    body.push_str(&bullet_list(list_names));
    let personal_message = personal_message.trim();
    if !personal_message.is_empty() {
        body.push_str(&format!("\n{personal_message}\n"));
    }
    body.push_str(&format!("\nTo see them, open:\n  {link}\n"));
    Message {
        subject: format!("{inviter_name} shares a wishlist with you"),
        body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_challenge_link() {
        assert_eq!(
            challenge_link("http://example.org/", "abc"),
            "http://example.org/challenge/abc"
        );
    }

    #[test]
    fn test_reminder_is_appended() {
        let msg = item_deleted("Noël", "Bike", Some("http://x/challenge/t"));
        assert!(msg.body.contains("\"Bike\""));
        assert!(msg.body.contains("PS:"));
        assert!(!item_deleted("Noël", "Bike", None).body.contains("PS:"));
    }

    #[test]
    fn test_list_destroyed_lists_titles() {
        let msg = list_destroyed("Noël", &["Bike".into(), "Book".into()], None);
        assert!(msg.body.contains("  - Bike\n  - Book\n"));
    }

    #[test]
    fn test_invitation_skips_blank_message() {
        let msg = invitation("Anna", &["Noël".into()], "http://x/challenge/t", "   ");
        assert!(msg.subject.starts_with("Anna"));
        assert!(!msg.body.contains("\n\n\n"));
        assert!(msg.body.contains("http://x/challenge/t"));
    }
}
