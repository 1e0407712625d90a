//! Background export and print jobs.
//!
//! A job works on an owned [`InvoiceDocument`] snapshot and reports back over
//! a channel the UI drains once per frame. [`guard::ExportGuard`] keeps a
//! second job from starting while one is running.

pub mod fonts;
pub mod guard;
pub mod layout;
pub mod pdf;
pub mod print;

use log::{error, info, warn};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use crate::document::InvoiceDocument;
use crate::error::Result;
use crate::view::Action;
use guard::ExportGuard;

#[derive(Debug)]
pub enum JobOutcome {
    Exported(PathBuf),
    Printed(PathBuf),
    Failed { action: Action, message: String },
}

pub struct Exporter {
    guard: ExportGuard,
    tx: Sender<JobOutcome>,
    rx: Receiver<JobOutcome>,
}

impl Default for Exporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Exporter {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Exporter {
            guard: ExportGuard::default(),
            tx,
            rx,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.guard.is_busy()
    }

    /// Starts `action` on a worker thread. Fails with
    /// [`crate::error::AppError::ExportBusy`] while another job holds the guard.
    /// `notify` runs after the outcome is sent, e.g. to wake the UI.
    pub fn start<F>(
        &self,
        action: Action,
        doc: InvoiceDocument,
        output_dir: PathBuf,
        notify: F,
    ) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        let ticket = self.guard.try_acquire().inspect_err(|_| {
            warn!("Rejected {:?}: another export is still running", action);
        })?;
        info!("Starting {:?} of invoice {}", action, doc.number);

        let tx = self.tx.clone();
        thread::spawn(move || {
            let outcome = match run(action, &doc, output_dir) {
                Ok(path) => match action {
                    Action::Export => JobOutcome::Exported(path),
                    Action::Print => JobOutcome::Printed(path),
                },
                Err(e) => {
                    error!("{:?} failed: {}", action, e);
                    JobOutcome::Failed {
                        action,
                        message: e.to_string(),
                    }
                }
            };
            // Free the guard before the UI hears about it.
            drop(ticket);
            let _ = tx.send(outcome);
            notify();
        });
        Ok(())
    }

    pub fn poll(&self) -> Option<JobOutcome> {
        self.rx.try_recv().ok()
    }
}

fn run(action: Action, doc: &InvoiceDocument, output_dir: PathBuf) -> Result<PathBuf> {
    match action {
        Action::Export => pdf::write_invoice_pdf(doc, &output_dir),
        Action::Print => print::print_document(doc),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::error::AppError;
    use crate::form::InvoiceForm;
    use std::fs;
    use std::sync::{Arc, Barrier};
    use std::time::{Duration, Instant};

    fn wait(exporter: &Exporter) -> JobOutcome {
        let deadline = Instant::now() + Duration::from_secs(30);
        loop {
            if let Some(outcome) = exporter.poll() {
                return outcome;
            }
            assert!(Instant::now() < deadline, "export did not finish");
            thread::sleep(Duration::from_millis(10));
        }
    }

    fn doc() -> InvoiceDocument {
        InvoiceDocument::from_form(&InvoiceForm::new(&Settings::default()))
    }

    #[test]
    fn export_job_reports_written_path() {
        let dir = std::env::temp_dir().join(format!("invoice-generator-job-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        let exporter = Exporter::new();
        exporter.start(Action::Export, doc(), dir.clone(), || {}).unwrap();
        match wait(&exporter) {
            JobOutcome::Exported(path) => assert_eq!(path, dir.join("Invoice-001.pdf")),
            other => panic!("unexpected outcome {:?}", other),
        }
        assert!(!exporter.is_busy());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn concurrent_start_is_rejected() {
        let exporter = Exporter::new();
        let barrier = Arc::new(Barrier::new(2));
        // Hold the guard directly so the first job can't finish early.
        let ticket = exporter.guard.try_acquire().unwrap();
        let result = exporter.start(Action::Export, doc(), std::env::temp_dir(), || {});
        assert!(matches!(result, Err(AppError::ExportBusy)));
        drop(ticket);
        let b = Arc::clone(&barrier);
        let dir = std::env::temp_dir().join(format!("invoice-generator-job2-{}", std::process::id()));
        exporter
            .start(Action::Export, doc(), dir.clone(), move || {
                b.wait();
            })
            .unwrap();
        barrier.wait();
        assert!(matches!(wait(&exporter), JobOutcome::Exported(_)));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn failure_is_reported_and_guard_released() {
        let file = std::env::temp_dir().join(format!("invoice-generator-blocker-{}", std::process::id()));
        fs::write(&file, b"not a directory").unwrap();
        let exporter = Exporter::new();
        exporter.start(Action::Export, doc(), file.clone(), || {}).unwrap();
        match wait(&exporter) {
            JobOutcome::Failed { action, .. } => assert_eq!(action, Action::Export),
            other => panic!("unexpected outcome {:?}", other),
        }
        assert!(!exporter.is_busy());
        fs::remove_file(&file).unwrap();
    }
}
