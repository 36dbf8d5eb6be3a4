// SPDX-License-Identifier: MIT OR Apache-2.0
//! Errno numbers, symbolic names and messages.

/// One row of the errno table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrnoEntry {
    /// Positive errno value.
    pub errno: i32,
    /// Symbolic name, e.g. `ENOENT`.
    pub name: &'static str,
    /// Short lower-case description.
    pub message: &'static str,
}

const fn entry(errno: i32, name: &'static str, message: &'static str) -> ErrnoEntry {
    ErrnoEntry {
        errno,
        name,
        message,
    }
}

/// Known errno values (Linux numbering), sorted by value.
pub const ERRNO_TABLE: &[ErrnoEntry] = &[
    entry(1, "EPERM", "operation not permitted"),
    entry(2, "ENOENT", "no such file or directory"),
    entry(3, "ESRCH", "no such process"),
    entry(4, "EINTR", "interrupted system call"),
    entry(5, "EIO", "i/o error"),
    entry(6, "ENXIO", "no such device or address"),
    entry(7, "E2BIG", "argument list too long"),
    entry(9, "EBADF", "bad file descriptor"),
    entry(11, "EAGAIN", "resource temporarily unavailable"),
    entry(12, "ENOMEM", "not enough memory"),
    entry(13, "EACCES", "permission denied"),
    entry(14, "EFAULT", "bad address in system call argument"),
    entry(16, "EBUSY", "resource busy or locked"),
    entry(17, "EEXIST", "file already exists"),
    entry(18, "EXDEV", "cross-device link not permitted"),
    entry(19, "ENODEV", "no such device"),
    entry(20, "ENOTDIR", "not a directory"),
    entry(21, "EISDIR", "illegal operation on a directory"),
    entry(22, "EINVAL", "invalid argument"),
    entry(23, "ENFILE", "file table overflow"),
    entry(24, "EMFILE", "too many open files"),
    entry(25, "ENOTTY", "inappropriate ioctl for device"),
    entry(26, "ETXTBSY", "text file is busy"),
    entry(27, "EFBIG", "file too large"),
    entry(28, "ENOSPC", "no space left on device"),
    entry(29, "ESPIPE", "invalid seek"),
    entry(30, "EROFS", "read-only file system"),
    entry(31, "EMLINK", "too many links"),
    entry(32, "EPIPE", "broken pipe"),
    entry(34, "ERANGE", "result too large"),
    entry(36, "ENAMETOOLONG", "name too long"),
    entry(38, "ENOSYS", "function not implemented"),
    entry(39, "ENOTEMPTY", "directory not empty"),
    entry(40, "ELOOP", "too many symbolic links encountered"),
    entry(71, "EPROTO", "protocol error"),
    entry(75, "EOVERFLOW", "value too large for defined data type"),
    entry(84, "EILSEQ", "illegal byte sequence"),
    entry(88, "ENOTSOCK", "socket operation on non-socket"),
    entry(89, "EDESTADDRREQ", "destination address required"),
    entry(90, "EMSGSIZE", "message too long"),
    entry(91, "EPROTOTYPE", "protocol wrong type for socket"),
    entry(93, "EPROTONOSUPPORT", "protocol not supported"),
    entry(95, "ENOTSUP", "operation not supported on socket"),
    entry(97, "EAFNOSUPPORT", "address family not supported"),
    entry(98, "EADDRINUSE", "address already in use"),
    entry(99, "EADDRNOTAVAIL", "address not available"),
    entry(100, "ENETDOWN", "network is down"),
    entry(101, "ENETUNREACH", "network is unreachable"),
    entry(103, "ECONNABORTED", "software caused connection abort"),
    entry(104, "ECONNRESET", "connection reset by peer"),
    entry(105, "ENOBUFS", "no buffer space available"),
    entry(106, "EISCONN", "socket is already connected"),
    entry(107, "ENOTCONN", "socket is not connected"),
    entry(108, "ESHUTDOWN", "cannot send after transport endpoint shutdown"),
    entry(110, "ETIMEDOUT", "connection timed out"),
    entry(111, "ECONNREFUSED", "connection refused"),
    entry(113, "EHOSTUNREACH", "host is unreachable"),
    entry(114, "EALREADY", "connection already in progress"),
    entry(125, "ECANCELED", "operation canceled"),
    entry(4095, "EOF", "end of file"),
];

/// Look up `errno`; negative values are treated as their magnitude.
pub fn errno_entry(errno: i32) -> Option<&'static ErrnoEntry> {
    let magnitude = i32::try_from(errno.unsigned_abs()).ok()?;
    ERRNO_TABLE
        .binary_search_by_key(&magnitude, |e| e.errno)
        .ok()
        .map(|index| &ERRNO_TABLE[index])
}

/// Symbolic name for `errno`.
pub fn errno_name(errno: i32) -> Option<&'static str> {
    errno_entry(errno).map(|e| e.name)
}

/// Description for `errno`.
pub fn errno_message(errno: i32) -> Option<&'static str> {
    errno_entry(errno).map(|e| e.message)
}

/// Positive errno value for a symbolic name.
pub fn errno_from_name(name: &str) -> Option<i32> {
    ERRNO_TABLE.iter().find(|e| e.name == name).map(|e| e.errno)
}

/// Symbolic name for `errno`, or `Unknown system error <errno>`.
///
/// ```
/// use errata_system::system_error_name;
///
/// assert_eq!(system_error_name(-2), "ENOENT");
/// assert_eq!(system_error_name(9999), "Unknown system error 9999");
/// ```
pub fn system_error_name(errno: i32) -> String {
    match errno_name(errno) {
        Some(name) => name.to_string(),
        None => format!("Unknown system error {errno}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_sorted_and_unique() {
        assert!(ERRNO_TABLE.windows(2).all(|w| w[0].errno < w[1].errno));
        let mut names: Vec<_> = ERRNO_TABLE.iter().map(|e| e.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), ERRNO_TABLE.len());
    }

    #[test]
    fn negative_values_are_normalised() {
        assert_eq!(errno_name(-104), Some("ECONNRESET"));
        assert_eq!(errno_name(104), Some("ECONNRESET"));
        assert_eq!(errno_message(-4095), Some("end of file"));
    }

    #[test]
    fn extreme_values_are_unknown() {
        assert_eq!(errno_name(i32::MIN), None);
        assert_eq!(errno_name(0), None);
        assert_eq!(system_error_name(0), "Unknown system error 0");
    }

    #[test]
    fn reverse_lookup() {
        assert_eq!(errno_from_name("EACCES"), Some(13));
        assert_eq!(errno_from_name("NOPE"), None);
    }
}
