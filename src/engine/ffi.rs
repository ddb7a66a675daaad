//! Binding to a system libunrar.
//!
//! Declares the narrow (`char*`) entry points of the unrar DLL API and
//! wraps them in [`NativeEngine`]. Paths, passwords and file names cross
//! the boundary as UTF-8 C strings, which is what libunrar expects on
//! Unix-like hosts. The structures below mirror `unrar.h`, which is
//! declared with 1-byte packing.

use std::ffi::{c_char, c_int, c_uint, c_void, CString};
use std::path::{Path, PathBuf};

use crate::engine::{
    code, ArchiveFlags, CommentOutcome, Engine, EngineCallback, EngineHandle, OpenRequest,
    OpenedArchive, Operation, RawHeader, Signal, MAX_VOLUME_PATH,
};
use crate::password::Password;
use crate::{Error, Result};

#[cfg(windows)]
type WChar = u16;
#[cfg(not(windows))]
type WChar = u32;

const UCM_CHANGEVOLUME: c_uint = 0;
const UCM_PROCESSDATA: c_uint = 1;
const UCM_NEEDPASSWORD: c_uint = 2;

const RAR_VOL_ASK: isize = 0;
const RAR_VOL_NOTIFY: isize = 1;

type NativeCallback =
    unsafe extern "C" fn(msg: c_uint, user_data: isize, p1: isize, p2: isize) -> c_int;

#[repr(C, packed)]
struct OpenArchiveDataEx {
    arc_name: *const c_char,
    arc_name_w: *const WChar,
    open_mode: c_uint,
    open_result: c_uint,
    cmt_buf: *mut c_char,
    cmt_buf_size: c_uint,
    cmt_size: c_uint,
    cmt_state: c_uint,
    flags: c_uint,
    callback: Option<NativeCallback>,
    user_data: isize,
    op_flags: c_uint,
    cmt_buf_w: *mut WChar,
    reserved: [c_uint; 25],
}

#[repr(C, packed)]
struct HeaderDataEx {
    arc_name: [c_char; 1024],
    arc_name_w: [WChar; 1024],
    file_name: [c_char; 1024],
    file_name_w: [WChar; 1024],
    flags: c_uint,
    pack_size: c_uint,
    pack_size_high: c_uint,
    unp_size: c_uint,
    unp_size_high: c_uint,
    host_os: c_uint,
    file_crc: c_uint,
    file_time: c_uint,
    unp_ver: c_uint,
    method: c_uint,
    file_attr: c_uint,
    cmt_buf: *mut c_char,
    cmt_buf_size: c_uint,
    cmt_size: c_uint,
    cmt_state: c_uint,
    dict_size: c_uint,
    hash_type: c_uint,
    hash: [c_char; 32],
    redir_type: c_uint,
    redir_name: *mut WChar,
    redir_name_size: c_uint,
    dir_target: c_uint,
    mtime_low: c_uint,
    mtime_high: c_uint,
    ctime_low: c_uint,
    ctime_high: c_uint,
    atime_low: c_uint,
    atime_high: c_uint,
    reserved: [c_uint; 988],
}

#[link(name = "unrar")]
unsafe extern "C" {
    fn RAROpenArchiveEx(data: *mut OpenArchiveDataEx) -> *mut c_void;
    fn RARCloseArchive(handle: *mut c_void) -> c_int;
    fn RARReadHeaderEx(handle: *mut c_void, header: *mut HeaderDataEx) -> c_int;
    fn RARProcessFile(
        handle: *mut c_void,
        operation: c_int,
        dest_path: *const c_char,
        dest_name: *const c_char,
    ) -> c_int;
    fn RARSetCallback(handle: *mut c_void, callback: Option<NativeCallback>, user_data: isize);
    fn RARSetPassword(handle: *mut c_void, password: *const c_char);
}

/// The stock engine, backed by a system libunrar.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeEngine;

impl NativeEngine {
    /// Creates the engine. Stateless; the library is linked at build time.
    pub fn new() -> Self {
        NativeEngine
    }
}

/// An open libunrar handle. The native handle is closed on drop.
#[derive(Debug)]
pub struct NativeHandle {
    raw: *mut c_void,
    archive_name: String,
}

// The raw handle is only touched through &mut self.
unsafe impl Send for NativeHandle {}

impl Drop for NativeHandle {
    fn drop(&mut self) {
        let result = unsafe { RARCloseArchive(self.raw) };
        if result != 0 {
            log::warn!("failed to close archive handle (code {result})");
        }
    }
}

fn path_to_cstring(path: &Path) -> Result<CString> {
    let text = path.to_str().ok_or_else(|| Error::InvalidInput {
        reason: format!("path is not valid UTF-8: {}", path.display()),
    })?;
    CString::new(text).map_err(|_| Error::InvalidInput {
        reason: "path contains an interior NUL byte".into(),
    })
}

fn chars_to_string(buf: &[c_char]) -> String {
    let bytes: Vec<u8> = buf
        .iter()
        .take_while(|&&c| c != 0)
        .map(|&c| c as u8)
        .collect();
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Borrows the session callback for the duration of one native call.
struct CallbackShim<'a> {
    target: &'a mut dyn EngineCallback,
}

unsafe extern "C" fn trampoline(msg: c_uint, user_data: isize, p1: isize, p2: isize) -> c_int {
    let shim = unsafe { &mut *(user_data as *mut CallbackShim<'_>) };
    match msg {
        UCM_PROCESSDATA => {
            let chunk = unsafe { std::slice::from_raw_parts(p1 as *const u8, p2 as usize) };
            match shim.target.data_chunk(chunk) {
                Signal::Continue => 0,
                Signal::Abort => -1,
            }
        }
        UCM_CHANGEVOLUME => match p2 {
            RAR_VOL_ASK => {
                // The engine's response buffer for the narrow message is
                // 2048 bytes; a longer path must abort, not truncate.
                let capacity = 2048usize.min(MAX_VOLUME_PATH);
                match shim.target.next_volume(capacity) {
                    Some(path) => match write_path_response(&path, p1, capacity) {
                        Ok(()) => 1,
                        Err(_) => -1,
                    },
                    None => -1,
                }
            }
            RAR_VOL_NOTIFY => {
                let name = unsafe { std::ffi::CStr::from_ptr(p1 as *const c_char) };
                let path = PathBuf::from(name.to_string_lossy().into_owned());
                match shim.target.volume_changed(&path) {
                    Signal::Continue => 0,
                    Signal::Abort => -1,
                }
            }
            _ => 0,
        },
        UCM_NEEDPASSWORD => {
            let capacity = p2 as usize;
            match shim.target.need_password(capacity) {
                Some(password) => {
                    let bytes = password.as_bytes();
                    if bytes.len() + 1 > capacity || bytes.contains(&0) {
                        return -1;
                    }
                    let out = p1 as *mut u8;
                    unsafe {
                        std::ptr::copy_nonoverlapping(bytes.as_ptr(), out, bytes.len());
                        *out.add(bytes.len()) = 0;
                    }
                    1
                }
                None => -1,
            }
        }
        // Wide-character variants; the narrow ones above are answered.
        _ => 0,
    }
}

fn write_path_response(path: &Path, buffer: isize, capacity: usize) -> Result<()> {
    let c_path = path_to_cstring(path)?;
    let bytes = c_path.as_bytes_with_nul();
    if bytes.len() > capacity {
        return Err(Error::SmallBuffer {
            what: "volume path",
        });
    }
    unsafe {
        std::ptr::copy_nonoverlapping(bytes.as_ptr(), buffer as *mut u8, bytes.len());
    }
    Ok(())
}

impl Engine for NativeEngine {
    type Handle = NativeHandle;

    fn open(&self, request: &OpenRequest<'_>) -> Result<OpenedArchive<NativeHandle>> {
        let arc_name = path_to_cstring(request.path)?;
        let mut comment_buf = vec![0u8; request.comment_capacity.max(1)];

        let mut data = OpenArchiveDataEx {
            arc_name: arc_name.as_ptr(),
            arc_name_w: std::ptr::null(),
            open_mode: request.mode.as_native(),
            open_result: 0,
            cmt_buf: if request.comment_capacity > 0 {
                comment_buf.as_mut_ptr() as *mut c_char
            } else {
                std::ptr::null_mut()
            },
            cmt_buf_size: request.comment_capacity as c_uint,
            cmt_size: 0,
            cmt_state: 0,
            flags: 0,
            callback: None,
            user_data: 0,
            op_flags: 0,
            cmt_buf_w: std::ptr::null_mut(),
            reserved: [0; 25],
        };

        let raw = unsafe { RAROpenArchiveEx(&mut data) };
        let open_result = data.open_result;
        if raw.is_null() || open_result != code::SUCCESS {
            if !raw.is_null() {
                unsafe { RARCloseArchive(raw) };
            }
            return Err(match Error::from_native(open_result) {
                Error::BadArchive { .. } => Error::BadArchive {
                    path: request.path.to_path_buf(),
                },
                other => other,
            });
        }

        let cmt_state = data.cmt_state;
        let cmt_size = data.cmt_size as usize;
        let comment = match cmt_state {
            0 => CommentOutcome::None,
            1 => {
                let end = cmt_size.min(comment_buf.len());
                CommentOutcome::Present(
                    String::from_utf8_lossy(&comment_buf[..end])
                        .trim_end_matches('\0')
                        .to_string(),
                )
            }
            s if s == code::SMALL_BUFFER => CommentOutcome::Truncated,
            s => {
                unsafe { RARCloseArchive(raw) };
                return Err(Error::from_native(s));
            }
        };

        let flags = data.flags;
        Ok(OpenedArchive {
            handle: NativeHandle {
                raw,
                archive_name: request.path.to_string_lossy().into_owned(),
            },
            flags: ArchiveFlags::from_bits(flags),
            comment,
        })
    }
}

impl EngineHandle for NativeHandle {
    fn set_password(&mut self, password: &Password) -> Result<()> {
        let c_password =
            CString::new(password.as_bytes()).map_err(|_| Error::InvalidInput {
                reason: "password contains an interior NUL byte".into(),
            })?;
        unsafe { RARSetPassword(self.raw, c_password.as_ptr()) };
        Ok(())
    }

    fn read_header(&mut self) -> Result<Option<RawHeader>> {
        // Large because of the fixed name buffers; zeroing is the
        // documented initial state.
        let mut header: Box<HeaderDataEx> = unsafe { Box::new(std::mem::zeroed()) };
        let result = unsafe { RARReadHeaderEx(self.raw, header.as_mut()) } as u32;
        match result {
            code::SUCCESS => {}
            code::END_ARCHIVE => return Ok(None),
            other => return Err(Error::from_native(other)),
        }

        // Packed struct: copy fields out before taking references.
        let file_name: [c_char; 1024] = header.file_name;
        let arc_name: [c_char; 1024] = header.arc_name;
        let hash: [c_char; 32] = header.hash;
        let mut hash_bytes = [0u8; 32];
        for (dst, src) in hash_bytes.iter_mut().zip(hash.iter()) {
            *dst = *src as u8;
        }

        Ok(Some(RawHeader {
            archive_name: chars_to_string(&arc_name),
            file_name: chars_to_string(&file_name),
            flags: header.flags,
            pack_size: header.pack_size,
            pack_size_high: header.pack_size_high,
            unp_size: header.unp_size,
            unp_size_high: header.unp_size_high,
            host_os: header.host_os,
            file_crc: header.file_crc,
            file_time: header.file_time,
            unp_ver: header.unp_ver,
            method: header.method,
            file_attr: header.file_attr,
            dict_size: header.dict_size,
            hash_type: header.hash_type,
            hash: hash_bytes,
            mtime_low: header.mtime_low,
            mtime_high: header.mtime_high,
            ctime_low: header.ctime_low,
            ctime_high: header.ctime_high,
            comment: None,
        }))
    }

    fn process(
        &mut self,
        operation: Operation,
        dest_dir: Option<&Path>,
        dest_file: Option<&Path>,
        callback: &mut dyn EngineCallback,
    ) -> Result<()> {
        let dest_dir = dest_dir.map(path_to_cstring).transpose()?;
        let dest_file = dest_file.map(path_to_cstring).transpose()?;

        let mut shim = CallbackShim { target: callback };
        unsafe {
            RARSetCallback(
                self.raw,
                Some(trampoline),
                &mut shim as *mut CallbackShim<'_> as isize,
            );
        }
        let result = unsafe {
            RARProcessFile(
                self.raw,
                operation.as_native() as c_int,
                dest_dir.as_ref().map_or(std::ptr::null(), |p| p.as_ptr()),
                dest_file.as_ref().map_or(std::ptr::null(), |p| p.as_ptr()),
            )
        } as u32;
        // Detach before the borrow ends; the engine must never call a
        // dangling shim.
        unsafe { RARSetCallback(self.raw, None, 0) };

        match result {
            code::SUCCESS => Ok(()),
            other => Err(Error::from_native(other)),
        }
    }
}

impl NativeHandle {
    /// Name of the volume file this handle was opened on.
    pub fn archive_name(&self) -> &str {
        &self.archive_name
    }
}
