use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{AppError, Result};

/// Allows one export or print job at a time.
#[derive(Debug, Clone, Default)]
pub struct ExportGuard {
    busy: Arc<AtomicBool>,
}

/// Held for the lifetime of a job; dropping it frees the guard.
#[derive(Debug)]
pub struct ExportTicket {
    busy: Arc<AtomicBool>,
}

impl ExportGuard {
    pub fn try_acquire(&self) -> Result<ExportTicket> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| AppError::ExportBusy)?;
        Ok(ExportTicket {
            busy: Arc::clone(&self.busy),
        })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

impl Drop for ExportTicket {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn second_acquire_is_rejected_until_release() {
        let guard = ExportGuard::default();
        let ticket = guard.try_acquire().unwrap();
        assert!(guard.is_busy());
        assert!(matches!(guard.try_acquire(), Err(AppError::ExportBusy)));
        drop(ticket);
        assert!(!guard.is_busy());
        assert!(guard.try_acquire().is_ok());
    }

    #[test]
    fn ticket_released_from_worker_thread() {
        let guard = ExportGuard::default();
        let ticket = guard.try_acquire().unwrap();
        thread::spawn(move || drop(ticket)).join().unwrap();
        assert!(!guard.is_busy());
    }

    #[test]
    fn clones_share_state() {
        let guard = ExportGuard::default();
        let other = guard.clone();
        let _ticket = guard.try_acquire().unwrap();
        assert!(other.try_acquire().is_err());
    }
}
