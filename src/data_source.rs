use std::io;
use std::io::{BufRead, BufReader, Read};

use crate::result::{incomplete_data_error, IonResult};

/// Positional byte-source operations that the readers require beyond what [BufRead] offers
/// directly: single-byte reads, conditional reads, bulk skips, and borrowed access to a run of
/// buffered bytes. A blanket implementation is provided for every `BufRead`.
pub trait IonDataSource: BufRead {
    /// Skips the next `number_of_bytes` bytes, failing if the stream ends first.
    fn skip_bytes(&mut self, number_of_bytes: usize) -> IonResult<()>;

    /// Returns the next byte in the stream, or `None` if the stream is exhausted.
    fn next_byte(&mut self) -> IonResult<Option<u8>>;

    /// Feeds bytes to `byte_processor` until it returns `false`, returning the total number of
    /// bytes that were consumed. Running out of data before the processor is satisfied is an
    /// error; this is only used to read atomic encoding primitives.
    fn read_next_byte_while<F>(&mut self, byte_processor: &mut F) -> IonResult<usize>
    where
        F: FnMut(u8) -> bool;

    /// Fills `buffer` from the stream, reporting an end-of-stream as an
    /// [IncompleteData](crate::result::IonError::IncompleteData) error rather than a raw IO error.
    fn read_exact_or_eof(&mut self, buffer: &mut [u8]) -> IonResult<()>;

    /// Makes the next `number_of_bytes` bytes available to `slice_processor` as a single slice.
    /// If the source's internal buffer already holds that many contiguous bytes, the slice is
    /// borrowed from it directly; otherwise the bytes are collected into `fallback_buffer` first.
    fn read_slice<T, F>(
        &mut self,
        number_of_bytes: usize,
        fallback_buffer: &mut Vec<u8>,
        slice_processor: F,
    ) -> IonResult<T>
    where
        F: FnOnce(&[u8]) -> IonResult<T>;
}

impl<T: BufRead> IonDataSource for T {
    fn skip_bytes(&mut self, number_of_bytes: usize) -> IonResult<()> {
        let mut remaining = number_of_bytes;
        while remaining > 0 {
            let buffered = self.fill_buf()?;
            if buffered.is_empty() {
                return incomplete_data_error("skipped bytes", number_of_bytes - remaining);
            }
            let bytes_to_consume = remaining.min(buffered.len());
            self.consume(bytes_to_consume);
            remaining -= bytes_to_consume;
        }
        Ok(())
    }

    fn next_byte(&mut self) -> IonResult<Option<u8>> {
        let buffered = self.fill_buf()?;
        let byte = match buffered.first() {
            Some(byte) => *byte,
            None => return Ok(None),
        };
        self.consume(1);
        Ok(Some(byte))
    }

    fn read_next_byte_while<F>(&mut self, byte_processor: &mut F) -> IonResult<usize>
    where
        F: FnMut(u8) -> bool,
    {
        let mut number_of_bytes_read: usize = 0;
        loop {
            match self.next_byte()? {
                Some(byte) => {
                    number_of_bytes_read += 1;
                    if !byte_processor(byte) {
                        return Ok(number_of_bytes_read);
                    }
                }
                None => {
                    return incomplete_data_error(
                        "a variable-length encoding primitive",
                        number_of_bytes_read,
                    )
                }
            }
        }
    }

    fn read_exact_or_eof(&mut self, buffer: &mut [u8]) -> IonResult<()> {
        if let Err(error) = self.read_exact(buffer) {
            return match error.kind() {
                io::ErrorKind::UnexpectedEof => incomplete_data_error("a value payload", 0),
                _ => Err(error.into()),
            };
        }
        Ok(())
    }

    fn read_slice<V, F>(
        &mut self,
        number_of_bytes: usize,
        fallback_buffer: &mut Vec<u8>,
        slice_processor: F,
    ) -> IonResult<V>
    where
        F: FnOnce(&[u8]) -> IonResult<V>,
    {
        let buffered = self.fill_buf()?;
        if buffered.len() >= number_of_bytes {
            let result = slice_processor(&buffered[..number_of_bytes]);
            self.consume(number_of_bytes);
            return result;
        }

        // The requested range spans more than one fill of the internal buffer; collect it into
        // the caller's scratch buffer instead.
        fallback_buffer.clear();
        fallback_buffer.resize(number_of_bytes, 0);
        self.read_exact_or_eof(fallback_buffer)?;
        slice_processor(fallback_buffer)
    }
}

/// Types that can be converted into an [IonDataSource] so a reader can be built over them.
pub trait ToIonDataSource {
    type DataSource: IonDataSource;
    fn to_ion_data_source(self) -> Self::DataSource;
}

impl ToIonDataSource for String {
    type DataSource = io::Cursor<Vec<u8>>;

    fn to_ion_data_source(self) -> Self::DataSource {
        io::Cursor::new(self.into_bytes())
    }
}

impl<'a> ToIonDataSource for &'a str {
    type DataSource = io::Cursor<&'a [u8]>;

    fn to_ion_data_source(self) -> Self::DataSource {
        io::Cursor::new(self.as_bytes())
    }
}

impl ToIonDataSource for Vec<u8> {
    type DataSource = io::Cursor<Vec<u8>>;

    fn to_ion_data_source(self) -> Self::DataSource {
        io::Cursor::new(self)
    }
}

impl<'a> ToIonDataSource for &'a [u8] {
    type DataSource = io::Cursor<&'a [u8]>;

    fn to_ion_data_source(self) -> Self::DataSource {
        io::Cursor::new(self)
    }
}

impl<'a, const N: usize> ToIonDataSource for &'a [u8; N] {
    type DataSource = io::Cursor<&'a [u8]>;

    fn to_ion_data_source(self) -> Self::DataSource {
        io::Cursor::new(self.as_slice())
    }
}

impl<T: AsRef<[u8]>> ToIonDataSource for io::Cursor<T> {
    type DataSource = Self;

    fn to_ion_data_source(self) -> Self::DataSource {
        self
    }
}

impl<R: Read> ToIonDataSource for BufReader<R> {
    type DataSource = Self;

    fn to_ion_data_source(self) -> Self::DataSource {
        self
    }
}
