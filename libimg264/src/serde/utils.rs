use std::io::Read;

use tracing::warn;

use crate::Error;

/// Reads until `len` bytes have been read or the stream ends.
///
/// The buffer is reserved up front so that a huge `len` is reported as
/// [`Error::AllocationFailure`] instead of aborting.
pub(crate) fn read_up_to(r: &mut impl Read, len: usize) -> Result<Vec<u8>, Error> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|_| Error::AllocationFailure { bytes: len })?;
    let limit = u64::try_from(len).unwrap_or(u64::MAX);
    r.by_ref().take(limit).read_to_end(&mut buf)?;
    Ok(buf)
}

/// Checks that the stream is exhausted.
///
/// Only data found after the payload is an error; a failure of the probe
/// read itself is logged and ignored.
pub(crate) fn ensure_exhausted(r: &mut impl Read) -> Result<(), Error> {
    let mut byte = [0u8; 1];
    match r.read(&mut byte) {
        Ok(0) => Ok(()),
        Ok(_) => Err(Error::TrailingBytes),
        Err(e) => {
            warn!("Unable to check for trailing bytes: {e}");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_up_to_stops_at_end_of_stream() {
        let bytes = [1, 2, 3];
        let buf = read_up_to(&mut &bytes[..], 8).unwrap();
        assert_eq!(buf, [1, 2, 3]);
    }

    #[test]
    fn read_up_to_leaves_the_rest() {
        let bytes = [1, 2, 3];
        let mut r = &bytes[..];
        assert_eq!(read_up_to(&mut r, 2).unwrap(), [1, 2]);
        assert_eq!(r, [3]);
    }

    #[test]
    fn impossible_reservation_is_allocation_failure() {
        let err = read_up_to(&mut &[0u8; 0][..], usize::MAX).unwrap_err();
        assert!(matches!(err, Error::AllocationFailure { .. }));
    }

    #[test]
    fn exhausted_stream() {
        assert!(ensure_exhausted(&mut &[0u8; 0][..]).is_ok());
        assert!(matches!(
            ensure_exhausted(&mut &[0u8][..]),
            Err(Error::TrailingBytes)
        ));
    }

    struct Unreadable;

    impl Read for Unreadable {
        fn read(&mut self, _: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("device gone"))
        }
    }

    #[test]
    fn failed_probe_read_is_not_an_error() {
        assert!(ensure_exhausted(&mut Unreadable).is_ok());
    }
}
