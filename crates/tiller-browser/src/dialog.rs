//! Capture of one-shot browser dialogs (alert, confirm, prompt).
//!
//! The applications these suites drive announce side effects through
//! `window.alert`: submitting a form pops a modal whose text is the only
//! record of what happened. The page layer auto-accepts every dialog so the
//! page never wedges, and records it here.
//!
//! Observation is scoped: a [`DialogProbe`] is armed immediately before the
//! triggering action and resolves with the next dialog's message (or nothing,
//! after a bounded wait). The probe deregisters itself on every exit path,
//! including early returns and panics in the test body, because
//! deregistration lives in `Drop`.
//!
//! # Design Rationale
//!
//! Accumulation uses `Arc<Mutex<..>>` rather than a channel: dialog history
//! must stay queryable after the fact, ordering matters, and volumes are
//! tiny. The armed observer is a `oneshot` sender stored next to the
//! history, so delivery and record-keeping happen under one lock.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};
use tokio::sync::oneshot;

/// The flavour of a captured dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DialogKind {
    /// `window.alert()`
    Alert,
    /// `window.confirm()`
    Confirm,
    /// `window.prompt()`
    Prompt,
    /// `beforeunload` interception
    BeforeUnload,
}

impl From<chromiumoxide::cdp::browser_protocol::page::DialogType> for DialogKind {
    fn from(kind: chromiumoxide::cdp::browser_protocol::page::DialogType) -> Self {
        use chromiumoxide::cdp::browser_protocol::page::DialogType;
        match kind {
            DialogType::Alert => Self::Alert,
            DialogType::Confirm => Self::Confirm,
            DialogType::Prompt => Self::Prompt,
            DialogType::Beforeunload => Self::BeforeUnload,
        }
    }
}

/// A dialog observed on the page, already accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapturedDialog {
    /// What kind of dialog fired.
    pub kind: DialogKind,

    /// The message the application put in the dialog.
    pub message: String,

    /// When the dialog was captured (system time, not page time).
    pub timestamp: SystemTime,
}

impl CapturedDialog {
    /// Creates a captured dialog stamped with the current time.
    #[must_use]
    pub fn new(kind: DialogKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            timestamp: SystemTime::now(),
        }
    }
}

/// An armed one-shot observer plus the full dialog history.
struct CaptureInner {
    history: Vec<CapturedDialog>,
    observer: Option<ArmedObserver>,
    next_probe_id: u64,
}

struct ArmedObserver {
    probe_id: u64,
    sender: oneshot::Sender<CapturedDialog>,
}

/// Thread-safe accumulator of dialogs observed on one page.
///
/// Cheaply cloneable; the page's CDP event task holds one clone and pushes
/// into it, test code holds another and arms probes against it.
#[derive(Clone)]
pub struct DialogCapture {
    inner: Arc<Mutex<CaptureInner>>,
}

impl DialogCapture {
    /// Creates a new, empty capture.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(CaptureInner {
                history: Vec::new(),
                observer: None,
                next_probe_id: 0,
            })),
        }
    }

    /// Records a dialog, delivering it to the armed probe if one exists.
    ///
    /// Called from the page's CDP event task. If the mutex is poisoned the
    /// dialog is dropped; the panic that poisoned it is the real failure.
    pub(crate) fn push(&self, dialog: CapturedDialog) {
        if let Ok(mut inner) = self.inner.lock() {
            if let Some(armed) = inner.observer.take() {
                // A lapsed receiver is fine - the dialog still lands in history.
                let _ = armed.sender.send(dialog.clone());
            }
            inner.history.push(dialog);
        }
    }

    /// Arms a one-shot probe for the *next* dialog.
    ///
    /// Must be called before the triggering action, not after: dialogs that
    /// fired earlier are history, not observations. Arming while another
    /// probe is armed replaces it; the replaced probe resolves to `None`.
    #[must_use]
    pub fn arm(&self) -> DialogProbe {
        let (sender, receiver) = oneshot::channel();
        let probe_id = {
            let mut inner = self
                .inner
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            let probe_id = inner.next_probe_id;
            inner.next_probe_id += 1;
            inner.observer = Some(ArmedObserver { probe_id, sender });
            probe_id
        };

        DialogProbe {
            receiver,
            capture: self.clone(),
            probe_id,
        }
    }

    /// Removes the armed observer if it is still the one `probe_id` installed.
    fn disarm(&self, probe_id: u64) {
        if let Ok(mut inner) = self.inner.lock() {
            if inner
                .observer
                .as_ref()
                .is_some_and(|armed| armed.probe_id == probe_id)
            {
                inner.observer = None;
            }
        }
    }

    /// Returns all captured dialogs as a snapshot.
    #[must_use]
    pub fn history(&self) -> Vec<CapturedDialog> {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .history
            .clone()
    }

    /// Returns the most recent dialog, if any.
    #[must_use]
    pub fn last(&self) -> Option<CapturedDialog> {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .history
            .last()
            .cloned()
    }

    /// Returns the number of dialogs captured.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .history
            .len()
    }

    /// Returns true if no dialogs have been captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clears the history. Any armed probe stays armed.
    pub fn clear(&self) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.history.clear();
        }
    }
}

impl Default for DialogCapture {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DialogCapture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DialogCapture")
            .field("captured", &self.len())
            .finish_non_exhaustive()
    }
}

/// A scoped, one-shot observer for the next dialog.
///
/// Obtained from [`DialogCapture::arm`]. Either [`DialogProbe::wait`] is
/// awaited or the probe is dropped; both paths deregister the observer.
#[derive(Debug)]
pub struct DialogProbe {
    receiver: oneshot::Receiver<CapturedDialog>,
    capture: DialogCapture,
    probe_id: u64,
}

impl DialogProbe {
    /// Waits up to `timeout` for the observed dialog.
    ///
    /// Resolves to `None` if no dialog fired in time or the probe was
    /// replaced by a newer one.
    pub async fn wait(mut self, timeout: Duration) -> Option<CapturedDialog> {
        match tokio::time::timeout(timeout, &mut self.receiver).await {
            Ok(Ok(dialog)) => Some(dialog),
            Ok(Err(_)) | Err(_) => None,
        }
    }
}

impl Drop for DialogProbe {
    fn drop(&mut self) {
        self.capture.disarm(self.probe_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn armed_probe_receives_the_next_dialog() {
        let capture = DialogCapture::new();
        let probe = capture.arm();

        capture.push(CapturedDialog::new(DialogKind::Alert, "Customer added"));

        let dialog = probe.wait(Duration::from_secs(1)).await;
        assert_eq!(dialog.map(|d| d.message).as_deref(), Some("Customer added"));
        assert_eq!(capture.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn probe_times_out_to_none() {
        let capture = DialogCapture::new();
        let probe = capture.arm();

        let dialog = probe.wait(Duration::from_secs(2)).await;
        assert!(dialog.is_none());
    }

    #[tokio::test]
    async fn dialogs_before_arming_are_history_not_observations() {
        let capture = DialogCapture::new();
        capture.push(CapturedDialog::new(DialogKind::Alert, "too early"));

        let probe = capture.arm();
        capture.push(CapturedDialog::new(DialogKind::Confirm, "on time"));

        let dialog = probe.wait(Duration::from_secs(1)).await.unwrap();
        assert_eq!(dialog.message, "on time");
        assert_eq!(dialog.kind, DialogKind::Confirm);
        assert_eq!(capture.len(), 2);
    }

    #[tokio::test]
    async fn dropping_the_probe_deregisters_it() {
        let capture = DialogCapture::new();
        let probe = capture.arm();
        drop(probe);

        // No observer left; the push only extends history.
        capture.push(CapturedDialog::new(DialogKind::Alert, "unobserved"));

        // A fresh probe observes the next dialog as usual.
        let probe = capture.arm();
        capture.push(CapturedDialog::new(DialogKind::Alert, "observed"));
        let dialog = probe.wait(Duration::from_secs(1)).await.unwrap();
        assert_eq!(dialog.message, "observed");
    }

    #[tokio::test]
    async fn rearming_replaces_the_previous_probe() {
        let capture = DialogCapture::new();
        let stale = capture.arm();
        let fresh = capture.arm();

        capture.push(CapturedDialog::new(DialogKind::Alert, "for the fresh probe"));

        let fresh_result = fresh.wait(Duration::from_secs(1)).await;
        assert_eq!(
            fresh_result.map(|d| d.message).as_deref(),
            Some("for the fresh probe")
        );

        let stale_result = stale.wait(Duration::from_millis(10)).await;
        assert!(stale_result.is_none());
    }

    #[tokio::test]
    async fn probe_observes_only_one_dialog() {
        let capture = DialogCapture::new();
        let probe = capture.arm();

        capture.push(CapturedDialog::new(DialogKind::Alert, "first"));
        capture.push(CapturedDialog::new(DialogKind::Alert, "second"));

        let dialog = probe.wait(Duration::from_secs(1)).await.unwrap();
        assert_eq!(dialog.message, "first");
        assert_eq!(capture.len(), 2);
    }

    #[test]
    fn history_accessors() {
        let capture = DialogCapture::new();
        assert!(capture.is_empty());
        assert!(capture.last().is_none());

        capture.push(CapturedDialog::new(DialogKind::Alert, "one"));
        capture.push(CapturedDialog::new(DialogKind::Prompt, "two"));

        assert_eq!(capture.len(), 2);
        assert_eq!(capture.last().map(|d| d.message).as_deref(), Some("two"));
        assert_eq!(capture.history()[0].message, "one");

        capture.clear();
        assert!(capture.is_empty());
    }
}
