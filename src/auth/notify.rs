//! User-facing notices ("toasts") raised by the auth provider.

use log::debug;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeVariant {
    Default,
    Destructive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub description: String,
    pub variant: NoticeVariant,
}

impl Notice {
    pub fn info(title: &str, description: &str) -> Self {
        Self {
            title: title.to_string(),
            description: description.to_string(),
            variant: NoticeVariant::Default,
        }
    }

    pub fn destructive(title: &str, description: &str) -> Self {
        Self {
            title: title.to_string(),
            description: description.to_string(),
            variant: NoticeVariant::Destructive,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NoticeSender {
    tx: mpsc::UnboundedSender<Notice>,
}

impl NoticeSender {
    /// Queue a notice. Dropped silently once the receiver is gone.
    pub fn send(&self, notice: Notice) {
        if self.tx.send(notice).is_err() {
            debug!("Notice dropped: receiver closed");
        }
    }
}

pub fn notice_channel() -> (NoticeSender, mpsc::UnboundedReceiver<Notice>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (NoticeSender { tx }, rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notices_arrive_in_order() {
        let (tx, mut rx) = notice_channel();
        tx.send(Notice::info("a", "first"));
        tx.send(Notice::destructive("b", "second"));
        assert_eq!(rx.try_recv().unwrap().title, "a");
        let second = rx.try_recv().unwrap();
        assert_eq!(second.variant, NoticeVariant::Destructive);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn send_after_receiver_dropped_is_harmless() {
        let (tx, rx) = notice_channel();
        drop(rx);
        tx.send(Notice::info("late", ""));
    }
}
