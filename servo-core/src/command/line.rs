/*
    Line Transport
        Frames a byte stream into `\n` terminated lines. A trailing `\r` is
        dropped. Lines that do not fit the buffer are discarded up to the next
        newline and reported once as `TooLong`.
*/

use super::*;

/* --------------------------- Error -------------------------- */
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LineError<E> {
    Io(E),
    Disconnected,
    TooLong,
    NotUtf8,
}

/* --------------------------- Code -------------------------- */
pub struct LineReader<const N: usize> {
    buf: [u8; N],
    filled: usize,
    consumed: usize,
}

impl<const N: usize> LineReader<N> {
    pub const fn new() -> Self {
        Self {
            buf: [0u8; N],
            filled: 0,
            consumed: 0,
        }
    }

    /// Drop any buffered bytes, e.g. when a new session starts.
    pub fn clear(&mut self) {
        self.filled = 0;
        self.consumed = 0;
    }

    fn compact(&mut self) {
        if self.consumed > 0 {
            self.buf.copy_within(self.consumed..self.filled, 0);
            self.filled -= self.consumed;
            self.consumed = 0;
        }
    }

    pub async fn read_line<R: Read>(&mut self, io: &mut R) -> Result<&str, LineError<R::Error>> {
        self.compact();
        let mut discarding = false;

        loop {
            if let Some(pos) = self.buf[..self.filled].iter().position(|&b| b == b'\n') {
                self.consumed = pos + 1;
                if discarding {
                    return Err(LineError::TooLong);
                }

                let mut line = &self.buf[..pos];
                if let [head @ .., b'\r'] = line {
                    line = head;
                }
                return core::str::from_utf8(line).map_err(|_| LineError::NotUtf8);
            }

            if self.filled == N {
                discarding = true;
                self.filled = 0;
            }

            let n = io.read(&mut self.buf[self.filled..]).await.map_err(LineError::Io)?;
            if n == 0 {
                return Err(LineError::Disconnected);
            }
            self.filled += n;
        }
    }
}

impl<const N: usize> Default for LineReader<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embassy_futures::block_on;

    /// Hands out at most `chunk` bytes per read.
    struct Trickle<'a> {
        data: &'a [u8],
        chunk: usize,
    }

    impl embedded_io_async::ErrorType for Trickle<'_> {
        type Error = Infallible;
    }

    impl Read for Trickle<'_> {
        async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Infallible> {
            let n = self.data.len().min(buf.len()).min(self.chunk);
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    fn next<const N: usize>(reader: &mut LineReader<N>, io: &mut Trickle<'_>) -> Result<String, LineError<Infallible>> {
        block_on(reader.read_line(io)).map(String::from)
    }

    #[test]
    fn splits_lines_and_strips_carriage_return() {
        let mut io = Trickle { data: b"g\r\n0.5 0.1\r\nh\n", chunk: 64 };
        let mut reader = LineReader::<16>::new();

        assert_eq!(next(&mut reader, &mut io).as_deref(), Ok("g"));
        assert_eq!(next(&mut reader, &mut io).as_deref(), Ok("0.5 0.1"));
        assert_eq!(next(&mut reader, &mut io).as_deref(), Ok("h"));
        assert_eq!(next(&mut reader, &mut io), Err(LineError::Disconnected));
    }

    #[test]
    fn reassembles_fragmented_input() {
        let mut io = Trickle { data: b"150 0 5000\r\nj\r\n", chunk: 1 };
        let mut reader = LineReader::<16>::new();

        assert_eq!(next(&mut reader, &mut io).as_deref(), Ok("150 0 5000"));
        assert_eq!(next(&mut reader, &mut io).as_deref(), Ok("j"));
    }

    #[test]
    fn overlong_line_is_reported_once_then_stream_resyncs() {
        let mut io = Trickle { data: b"0123456789abcdef0123\r\nr\r\n", chunk: 5 };
        let mut reader = LineReader::<8>::new();

        assert_eq!(next(&mut reader, &mut io), Err(LineError::TooLong));
        assert_eq!(next(&mut reader, &mut io).as_deref(), Ok("r"));
    }

    #[test]
    fn line_filling_the_buffer_exactly_needs_its_newline_inside() {
        let mut io = Trickle { data: b"1234567\nq\n", chunk: 64 };
        let mut reader = LineReader::<8>::new();

        assert_eq!(next(&mut reader, &mut io).as_deref(), Ok("1234567"));
        assert_eq!(next(&mut reader, &mut io).as_deref(), Ok("q"));
    }

    #[test]
    fn invalid_utf8_is_consumed() {
        let mut io = Trickle { data: b"\xff\xfe\nb\n", chunk: 64 };
        let mut reader = LineReader::<8>::new();

        assert_eq!(next(&mut reader, &mut io), Err(LineError::NotUtf8));
        assert_eq!(next(&mut reader, &mut io).as_deref(), Ok("b"));
    }

    #[test]
    fn empty_lines_are_returned_as_empty() {
        let mut io = Trickle { data: b"\r\n\n", chunk: 64 };
        let mut reader = LineReader::<8>::new();

        assert_eq!(next(&mut reader, &mut io).as_deref(), Ok(""));
        assert_eq!(next(&mut reader, &mut io).as_deref(), Ok(""));
    }
}
