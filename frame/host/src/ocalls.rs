use frame_types::UntrustedStatus;
use std::{
    cell::Cell,
    ffi::CStr,
    marker::PhantomData,
    os::raw::c_char,
    slice,
};
use tracing::{error, warn};

/// What the enclave may ask of the host while an ecall is in progress.
pub trait UntrustedServices: Send + Sync {
    /// Writes `msg` to the host's standard output, unmodified.
    fn print_string(&self, msg: &[u8]);

    /// Reads one line into `buf` with `fgets` semantics, minus the trailing
    /// newline, and NUL terminates it. Returns the number of bytes before the NUL.
    fn get_user_input(&self, buf: &mut [u8]) -> usize;

    fn save_enclave_data(&self, sealed: &[u8]) -> UntrustedStatus;

    fn load_enclave_data(&self, sealed: &mut [u8]) -> UntrustedStatus;
}

type ServicesPtr = *const (dyn UntrustedServices + 'static);

thread_local! {
    // Ocalls run on the thread that issued the ecall, so the services of the
    // ecall in flight are found here.
    static CURRENT_SERVICES: Cell<Option<ServicesPtr>> = Cell::new(None);
}

/// Restores the previously installed services when dropped.
pub(crate) struct ServicesGuard<'a> {
    prev: Option<ServicesPtr>,
    _marker: PhantomData<&'a dyn UntrustedServices>,
}

/// Makes `services` reachable from the ocall entry points on this thread.
pub(crate) fn install<'a>(services: &'a dyn UntrustedServices) -> ServicesGuard<'a> {
    let ptr = services as *const (dyn UntrustedServices + 'a);
    // The guard borrows `services` for 'a and clears the slot on drop.
    let ptr: ServicesPtr = unsafe { std::mem::transmute(ptr) };
    let prev = CURRENT_SERVICES.with(|c| c.replace(Some(ptr)));

    ServicesGuard {
        prev,
        _marker: PhantomData,
    }
}

impl Drop for ServicesGuard<'_> {
    fn drop(&mut self) {
        CURRENT_SERVICES.with(|c| c.set(self.prev));
    }
}

/// True while this thread is inside an ecall.
pub(crate) fn in_enclave_call() -> bool {
    CURRENT_SERVICES.with(|c| c.get().is_some())
}

fn with_services<R>(f: impl FnOnce(&dyn UntrustedServices) -> R) -> Option<R> {
    let ptr = CURRENT_SERVICES.with(|c| c.get())?;
    // Only set by `install`, whose guard outlives the ecall.
    Some(f(unsafe { &*ptr }))
}

#[no_mangle]
pub extern "C" fn untrusted_print_string(s: *const c_char) {
    if s.is_null() {
        return;
    }
    let msg = unsafe { CStr::from_ptr(s) }.to_bytes();

    if with_services(|svc| svc.print_string(msg)).is_none() {
        warn!("print_string ocall outside of an ecall, dropped");
    }
}

#[no_mangle]
pub extern "C" fn untrusted_get_user_input(ret_str: *mut c_char, n: usize) {
    if ret_str.is_null() || n == 0 {
        return;
    }
    let buf = unsafe { slice::from_raw_parts_mut(ret_str as *mut u8, n) };

    if with_services(|svc| svc.get_user_input(buf)).is_none() {
        warn!("get_user_input ocall outside of an ecall");
        buf[0] = 0;
    }
}

#[no_mangle]
pub extern "C" fn untrusted_save_enclave_data(sealed_data: *const u8, sealed_size: usize) -> i32 {
    let data = if sealed_size == 0 {
        <&[u8]>::default()
    } else if sealed_data.is_null() {
        error!("save_enclave_data ocall with a null buffer");
        return UntrustedStatus::IO_FAILED.0;
    } else {
        unsafe { slice::from_raw_parts(sealed_data, sealed_size) }
    };

    with_services(|svc| svc.save_enclave_data(data))
        .unwrap_or_else(|| {
            warn!("save_enclave_data ocall outside of an ecall");
            UntrustedStatus::error()
        })
        .0
}

#[no_mangle]
pub extern "C" fn untrusted_load_enclave_data(sealed_data: *mut u8, sealed_size: usize) -> i32 {
    let buf = if sealed_size == 0 {
        <&mut [u8]>::default()
    } else if sealed_data.is_null() {
        error!("load_enclave_data ocall with a null buffer");
        return UntrustedStatus::IO_FAILED.0;
    } else {
        unsafe { slice::from_raw_parts_mut(sealed_data, sealed_size) }
    };

    with_services(|svc| svc.load_enclave_data(buf))
        .unwrap_or_else(|| {
            warn!("load_enclave_data ocall outside of an ecall");
            UntrustedStatus::error()
        })
        .0
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::{ffi::CString, ptr};

    #[derive(Default)]
    struct Recorder {
        printed: Mutex<Vec<u8>>,
        saved: Mutex<Vec<u8>>,
    }

    impl UntrustedServices for Recorder {
        fn print_string(&self, msg: &[u8]) {
            self.printed.lock().extend_from_slice(msg);
        }

        fn get_user_input(&self, buf: &mut [u8]) -> usize {
            let line = b"typed";
            let n = line.len().min(buf.len() - 1);
            buf[..n].copy_from_slice(&line[..n]);
            buf[n] = 0;
            n
        }

        fn save_enclave_data(&self, sealed: &[u8]) -> UntrustedStatus {
            *self.saved.lock() = sealed.to_vec();
            UntrustedStatus::success()
        }

        fn load_enclave_data(&self, sealed: &mut [u8]) -> UntrustedStatus {
            let saved = self.saved.lock();
            if saved.len() < sealed.len() {
                return UntrustedStatus::IO_FAILED;
            }
            sealed.copy_from_slice(&saved[..sealed.len()]);
            UntrustedStatus::success()
        }
    }

    #[test]
    fn test_ocalls_reach_installed_services() {
        let recorder = Recorder::default();
        {
            let _guard = install(&recorder);
            assert!(in_enclave_call());

            let msg = CString::new("Public Key:").unwrap();
            untrusted_print_string(msg.as_ptr());

            let data = [1u8, 2, 3];
            assert_eq!(untrusted_save_enclave_data(data.as_ptr(), data.len()), 0);

            let mut back = [0u8; 3];
            assert_eq!(untrusted_load_enclave_data(back.as_mut_ptr(), back.len()), 0);
            assert_eq!(back, data);

            let mut short = [0u8; 8];
            assert_eq!(untrusted_load_enclave_data(short.as_mut_ptr(), short.len()), 2);

            let mut line = [0xffu8; 16];
            untrusted_get_user_input(line.as_mut_ptr() as *mut c_char, line.len());
            assert_eq!(&line[..6], b"typed\0");
        }
        assert!(!in_enclave_call());
        assert_eq!(&recorder.printed.lock()[..], b"Public Key:");
    }

    #[test]
    fn test_ocalls_without_services_fail_softly() {
        assert!(!in_enclave_call());

        let data = [1u8];
        assert_eq!(untrusted_save_enclave_data(data.as_ptr(), 1), 1);

        let mut line = [0xffu8; 4];
        untrusted_get_user_input(line.as_mut_ptr() as *mut c_char, line.len());
        assert_eq!(line[0], 0);
    }

    #[test]
    fn test_null_buffers_are_rejected() {
        let recorder = Recorder::default();
        let _guard = install(&recorder);

        assert_eq!(untrusted_save_enclave_data(ptr::null(), 4), 2);
        assert_eq!(untrusted_load_enclave_data(ptr::null_mut(), 4), 2);
        untrusted_print_string(ptr::null());
        assert!(recorder.printed.lock().is_empty());
    }

    #[test]
    fn test_nested_install_restores_outer() {
        let outer = Recorder::default();
        let inner = Recorder::default();
        let _outer_guard = install(&outer);
        {
            let _inner_guard = install(&inner);
            let msg = CString::new("inner").unwrap();
            untrusted_print_string(msg.as_ptr());
        }
        let msg = CString::new("outer").unwrap();
        untrusted_print_string(msg.as_ptr());

        assert_eq!(&inner.printed.lock()[..], b"inner");
        assert_eq!(&outer.printed.lock()[..], b"outer");
    }
}
