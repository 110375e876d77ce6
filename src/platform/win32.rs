use std::os::windows::ffi::OsStrExt;
use std::path::Path;

use windows::core::PCWSTR;
use windows::Win32::Foundation::{FILETIME, HINSTANCE};
use windows::Win32::System::Threading::GetSystemTimes;
use windows::Win32::UI::WindowsAndMessaging::{
    DestroyIcon, LoadImageW, HICON, IMAGE_ICON, LR_DEFAULTSIZE, LR_LOADFROMFILE,
};

use crate::load::{CpuTicks, SampleUnavailable, TickSource};

/// System-wide CPU times from `GetSystemTimes`, in 100ns units.
#[derive(Debug, Default)]
pub struct SystemTimes;

impl TickSource for SystemTimes {
    fn read_ticks(&self) -> Result<CpuTicks, SampleUnavailable> {
        let mut idle = FILETIME::default();
        let mut kernel = FILETIME::default();
        let mut user = FILETIME::default();

        unsafe {
            GetSystemTimes(
                Some(&mut idle as *mut _),
                Some(&mut kernel as *mut _),
                Some(&mut user as *mut _),
            )
        }
        .map_err(|e| SampleUnavailable::Read(std::io::Error::other(e)))?;

        let idle = filetime_to_u64(idle);
        // Kernel time includes idle time.
        let system = filetime_to_u64(kernel).saturating_sub(idle);

        Ok(CpuTicks {
            user: filetime_to_u64(user),
            system,
            idle,
            nice: 0,
        })
    }
}

fn filetime_to_u64(ft: FILETIME) -> u64 {
    (ft.dwHighDateTime as u64) << 32 | ft.dwLowDateTime as u64
}

/// NUL-terminated UTF-16 for Win32 string parameters.
pub fn wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

/// Load an `.ico` file at the system's default small-icon size.
pub fn load_icon_file(path: &Path) -> Option<HICON> {
    let wide_path: Vec<u16> = path
        .as_os_str()
        .encode_wide()
        .chain(std::iter::once(0))
        .collect();

    unsafe {
        LoadImageW(
            HINSTANCE::default(),
            PCWSTR(wide_path.as_ptr()),
            IMAGE_ICON,
            0,
            0,
            LR_LOADFROMFILE | LR_DEFAULTSIZE,
        )
    }
    .ok()
    .map(|handle| HICON(handle.0))
}

pub fn destroy_icon(icon: HICON) {
    unsafe {
        let _ = DestroyIcon(icon);
    }
}
