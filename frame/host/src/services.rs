use crate::{console::read_line_into, ocalls::UntrustedServices, sealed_store::SealedStore};
use frame_types::UntrustedStatus;
use parking_lot::Mutex;
use std::io::{self, BufRead, Write};
use tracing::{error, warn};

/// Where console input comes from.
pub enum ConsoleInput {
    Stdin,
    Reader(Box<dyn BufRead + Send>),
}

impl ConsoleInput {
    fn read_line_into(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            ConsoleInput::Stdin => read_line_into(&mut io::stdin().lock(), buf),
            ConsoleInput::Reader(reader) => read_line_into(reader.as_mut(), buf),
        }
    }
}

/// The host's side of every ocall: console I/O plus the sealed state file.
///
/// The application shares the same console for its own prompts, so output from
/// the host and from the enclave interleaves in call order.
pub struct HostServices {
    sealed: SealedStore,
    input: Mutex<ConsoleInput>,
    output: Mutex<Box<dyn Write + Send>>,
}

impl HostServices {
    pub fn new(sealed: SealedStore) -> Self {
        Self::with_console(sealed, ConsoleInput::Stdin, Box::new(io::stdout()))
    }

    pub fn with_console(
        sealed: SealedStore,
        input: ConsoleInput,
        output: Box<dyn Write + Send>,
    ) -> Self {
        HostServices {
            sealed,
            input: Mutex::new(input),
            output: Mutex::new(output),
        }
    }

    pub fn sealed_store(&self) -> &SealedStore {
        &self.sealed
    }

    /// Writes to the console without a trailing newline, then flushes.
    pub fn write_console(&self, bytes: &[u8]) -> io::Result<()> {
        let mut out = self.output.lock();
        out.write_all(bytes)?;
        out.flush()
    }

    /// Reads one line from the console into `buf`.
    pub fn read_console_line(&self, buf: &mut [u8]) -> io::Result<usize> {
        self.input.lock().read_line_into(buf)
    }
}

impl UntrustedServices for HostServices {
    fn print_string(&self, msg: &[u8]) {
        if let Err(e) = self.write_console(msg) {
            warn!("Failed to print enclave output: {}", e);
        }
    }

    fn get_user_input(&self, buf: &mut [u8]) -> usize {
        match self.read_console_line(buf) {
            Ok(n) => n,
            Err(e) => {
                warn!("Failed to read console input: {}", e);
                if let Some(first) = buf.first_mut() {
                    *first = 0;
                }
                0
            }
        }
    }

    fn save_enclave_data(&self, sealed: &[u8]) -> UntrustedStatus {
        match self.sealed.save(sealed) {
            Ok(()) => UntrustedStatus::success(),
            Err(e) => {
                error!("Failed to save sealed state: {}", e);
                e.status()
            }
        }
    }

    fn load_enclave_data(&self, sealed: &mut [u8]) -> UntrustedStatus {
        match self.sealed.load(sealed) {
            Ok(()) => UntrustedStatus::success(),
            Err(e) => e.status(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use test_utils::SharedBuffer;

    fn services(dir: &tempfile::TempDir, input: &'static [u8]) -> (HostServices, SharedBuffer) {
        let out = SharedBuffer::new();
        let services = HostServices::with_console(
            SealedStore::new(dir.path().join("enclave_data.seal")),
            ConsoleInput::Reader(Box::new(Cursor::new(input))),
            Box::new(out.clone()),
        );
        (services, out)
    }

    #[test]
    fn test_print_string_is_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let (services, out) = services(&dir, b"");

        services.print_string(b"gx: ");
        services.print_string(b"00ff\n");

        assert_eq!(out.contents(), "gx: 00ff\n");
    }

    #[test]
    fn test_get_user_input_reads_lines_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let (services, _) = services(&dir, b"{\"a\":1}\n0102\n");
        let mut buf = [0u8; 32];

        assert_eq!(services.get_user_input(&mut buf), 7);
        assert_eq!(&buf[..8], b"{\"a\":1}\0");
        assert_eq!(services.get_user_input(&mut buf), 4);
        assert_eq!(&buf[..5], b"0102\0");
    }

    #[test]
    fn test_sealed_state_round_trip_and_codes() {
        let dir = tempfile::tempdir().unwrap();
        let (services, _) = services(&dir, b"");
        let mut buf = [0u8; 8];

        assert_eq!(services.load_enclave_data(&mut buf), UntrustedStatus::OPEN_FAILED);
        assert_eq!(services.save_enclave_data(&[6u8; 8]), UntrustedStatus::SUCCESS);
        assert_eq!(services.load_enclave_data(&mut buf), UntrustedStatus::SUCCESS);
        assert_eq!(buf, [6u8; 8]);

        let mut bigger = [0u8; 9];
        assert_eq!(services.load_enclave_data(&mut bigger), UntrustedStatus::IO_FAILED);
    }
}
