//! Thin OS wrappers.
//!
//! Everything here either queries the OS once or applies one-time process
//! configuration; none of it keeps state.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

/// Extension of executables on this platform, without the dot.
pub const EXE_EXTENSION: &str = std::env::consts::EXE_EXTENSION;

/// Path of the running executable.
pub fn current_exe() -> io::Result<PathBuf> {
    std::env::current_exe()
}

/// Restricts where the process loads libraries from.
///
/// Must run before anything else loads a DLL; there is nothing to undo later.
#[cfg(windows)]
pub fn harden_process() {
    use windows_sys::Win32::Storage::FileSystem::{
        SetSearchPathMode, BASE_SEARCH_PATH_ENABLE_SAFE_SEARCHMODE, BASE_SEARCH_PATH_PERMANENT,
    };
    use windows_sys::Win32::System::LibraryLoader::{
        SetDefaultDllDirectories, SetDllDirectoryW, LOAD_LIBRARY_SEARCH_SYSTEM32,
    };

    let empty: [u16; 1] = [0];
    unsafe {
        SetSearchPathMode(BASE_SEARCH_PATH_ENABLE_SAFE_SEARCHMODE | BASE_SEARCH_PATH_PERMANENT);
        SetDllDirectoryW(empty.as_ptr());
        SetDefaultDllDirectories(LOAD_LIBRARY_SEARCH_SYSTEM32);
    }
    tracing::debug!("restricted DLL search path");
}

#[cfg(not(windows))]
pub fn harden_process() {}

/// Free bytes available to the current user on the volume holding `path`.
///
/// `path` need not exist yet; the volume is the one of its nearest existing
/// ancestor.
pub fn available_space(path: &Path) -> io::Result<u64> {
    let existing = nearest_existing(path).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::NotFound,
            format!("no existing ancestor of {}", path.display()),
        )
    })?;
    volume_free_space(existing)
}

/// `path` itself or its closest ancestor that exists.
pub fn nearest_existing(path: &Path) -> Option<&Path> {
    path.ancestors().find(|ancestor| ancestor.exists())
}

#[cfg(unix)]
fn volume_free_space(path: &Path) -> io::Result<u64> {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let c_path = CString::new(path.as_os_str().as_bytes())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    let mut stat: libc::statvfs = unsafe { std::mem::zeroed() };
    let ret = unsafe { libc::statvfs(c_path.as_ptr(), &mut stat) };
    if ret != 0 {
        return Err(io::Error::last_os_error());
    }

    // f_bavail counts blocks available to unprivileged users.
    let bavail: u64 = stat.f_bavail as _;
    let frsize: u64 = stat.f_frsize as _;
    Ok(bavail.saturating_mul(frsize))
}

#[cfg(windows)]
fn volume_free_space(path: &Path) -> io::Result<u64> {
    use std::os::windows::ffi::OsStrExt;
    use windows_sys::Win32::Storage::FileSystem::GetDiskFreeSpaceExW;

    let wide: Vec<u16> = path.as_os_str().encode_wide().chain(Some(0)).collect();
    let mut free_to_caller: u64 = 0;
    let ok = unsafe {
        GetDiskFreeSpaceExW(
            wide.as_ptr(),
            &mut free_to_caller,
            std::ptr::null_mut(),
            std::ptr::null_mut(),
        )
    };
    if ok == 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(free_to_caller)
}

#[cfg(not(any(unix, windows)))]
fn volume_free_space(_path: &Path) -> io::Result<u64> {
    Ok(u64::MAX)
}

/// Arguments the bootstrap received, kept uninterpreted for the updater.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForwardedArgs {
    /// The raw command-line text after the program name.
    #[cfg(windows)]
    Raw(OsString),
    /// The argument vector after the program name.
    List(Vec<OsString>),
}

impl ForwardedArgs {
    /// Captures the current process's arguments.
    #[cfg(windows)]
    pub fn from_env() -> Self {
        use std::os::windows::ffi::OsStringExt;
        use windows_sys::Win32::System::Environment::GetCommandLineW;

        let line = unsafe {
            let ptr = GetCommandLineW();
            let mut len = 0;
            while *ptr.add(len) != 0 {
                len += 1;
            }
            std::slice::from_raw_parts(ptr, len)
        };
        ForwardedArgs::Raw(OsString::from_wide(command_tail(line)))
    }

    #[cfg(not(windows))]
    pub fn from_env() -> Self {
        ForwardedArgs::List(std::env::args_os().skip(1).collect())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            #[cfg(windows)]
            ForwardedArgs::Raw(raw) => raw.is_empty(),
            ForwardedArgs::List(args) => args.is_empty(),
        }
    }

    /// The arguments as they appear in a rendered command line.
    pub fn display(&self) -> String {
        match self {
            #[cfg(windows)]
            ForwardedArgs::Raw(raw) => raw.to_string_lossy().into_owned(),
            ForwardedArgs::List(args) => args
                .iter()
                .map(|arg| arg.to_string_lossy())
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

/// Skips the program name of a Windows command line and the blanks after it.
///
/// The program name ends at the closing quote when it starts with one, otherwise
/// at the first space or tab.
pub fn command_tail(line: &[u16]) -> &[u16] {
    const QUOTE: u16 = b'"' as u16;
    const SPACE: u16 = b' ' as u16;
    const TAB: u16 = b'\t' as u16;

    let rest = match line.first() {
        Some(&QUOTE) => match line[1..].iter().position(|&c| c == QUOTE) {
            Some(close) => &line[close + 2..],
            None => &[],
        },
        _ => {
            let end = line
                .iter()
                .position(|&c| c == SPACE || c == TAB)
                .unwrap_or(line.len());
            &line[end..]
        }
    };
    let start = rest
        .iter()
        .position(|&c| c != SPACE && c != TAB)
        .unwrap_or(rest.len());
    &rest[start..]
}
