use std::io;
use std::path::{Path, PathBuf};

use crate::document::InvoiceDocument;
use crate::error::Result;
use crate::export::pdf;
use crate::platform;

pub fn print_dir() -> PathBuf {
    std::env::temp_dir().join("invoice-generator-print")
}

/// Renders the document to a scratch PDF and hands it to the system viewer,
/// which owns the actual print dialog. Fails if the viewer can't be started.
pub fn print_document(doc: &InvoiceDocument) -> Result<PathBuf> {
    print_with(doc, &print_dir(), platform::open)
}

fn print_with<F>(doc: &InvoiceDocument, dir: &Path, open: F) -> Result<PathBuf>
where
    F: FnOnce(&Path) -> io::Result<()>,
{
    let path = pdf::write_invoice_pdf(doc, dir)?;
    open(&path)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::error::AppError;
    use crate::form::InvoiceForm;
    use std::fs;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "invoice-generator-print-{}-{}",
            name,
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    fn doc() -> InvoiceDocument {
        InvoiceDocument::from_form(&InvoiceForm::new(&Settings::default()))
    }

    #[test]
    fn viewer_launch_failure_is_reported() {
        let dir = scratch("fail");
        let result = print_with(&doc(), &dir, |_| {
            Err(io::Error::new(io::ErrorKind::NotFound, "no viewer"))
        });
        assert!(matches!(result, Err(AppError::Io(e)) if e.kind() == io::ErrorKind::NotFound));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn viewer_receives_written_pdf() {
        let dir = scratch("ok");
        let mut opened = None;
        let path = print_with(&doc(), &dir, |p| {
            opened = Some(p.to_path_buf());
            Ok(())
        })
        .unwrap();
        assert_eq!(opened.as_deref(), Some(path.as_path()));
        assert_eq!(path, dir.join("Invoice-001.pdf"));
        fs::remove_dir_all(&dir).unwrap();
    }
}
