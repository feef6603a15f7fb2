use std::io::{self, BufRead};

/// Reads one line into `buf` the way `fgets` does, then drops the trailing newline.
///
/// At most `buf.len() - 1` bytes are taken and the result is always NUL terminated.
/// Whatever does not fit stays in `reader` for the next call. Returns the length
/// of the stored line.
pub fn read_line_into<R: BufRead + ?Sized>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let cap = match buf.len() {
        0 => return Ok(0),
        n => n - 1,
    };

    let mut len = 0;
    while len < cap {
        let available = match reader.fill_buf() {
            Ok(b) => b,
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                buf[len] = 0;
                return Err(e);
            }
        };
        if available.is_empty() {
            break;
        }

        let want = (cap - len).min(available.len());
        let (take, hit_newline) = match available[..want].iter().position(|&b| b == b'\n') {
            Some(i) => (i + 1, true),
            None => (want, false),
        };
        buf[len..len + take].copy_from_slice(&available[..take]);
        reader.consume(take);
        len += take;

        if hit_newline {
            break;
        }
    }

    if len > 0 && buf[len - 1] == b'\n' {
        len -= 1;
    }
    buf[len] = 0;

    Ok(len)
}
