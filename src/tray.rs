//! System tray icon that shows the current runner frame, with the CPU load as
//! its tooltip and a right-click menu for runner, theme and quit.
//! Uses Win32 Shell_NotifyIconW API directly.

use std::path::Path;

use winit::event_loop::EventLoopProxy;

use crate::app::AppEvent;
use crate::playback::PlaybackState;
use crate::sprite::{Runner, Selection, SpriteSheet, Theme};

#[cfg(windows)]
use std::cell::{Cell, RefCell};

#[cfg(windows)]
use windows::Win32::Foundation::{HWND, LPARAM, LRESULT, WPARAM};
#[cfg(windows)]
use windows::Win32::UI::Shell::{
    Shell_NotifyIconW, NIF_ICON, NIF_MESSAGE, NIF_TIP, NIM_ADD, NIM_DELETE, NIM_MODIFY,
    NOTIFYICONDATAW,
};
#[cfg(windows)]
use windows::Win32::UI::WindowsAndMessaging::{
    AppendMenuW, CreatePopupMenu, CreateWindowExW, DefWindowProcW, DestroyMenu, DestroyWindow,
    GetCursorPos, LoadIconW, RegisterClassW, SetForegroundWindow, TrackPopupMenu, CS_HREDRAW,
    CS_VREDRAW, HICON, HMENU, IDI_APPLICATION, MF_CHECKED, MF_POPUP, MF_SEPARATOR, MF_STRING,
    MF_UNCHECKED, TPM_BOTTOMALIGN, TPM_LEFTALIGN, WM_COMMAND, WM_DESTROY, WM_USER, WNDCLASSW,
    WS_EX_TOOLWINDOW,
};

#[cfg(windows)]
use crate::platform::win32;

/// Custom message ID for tray icon callbacks.
#[cfg(windows)]
const WM_TRAYICON: u32 = WM_USER + 1;

/// Menu item IDs.
const ID_QUIT: u16 = 1000;
const ID_RUNNER_BASE: u16 = 1100;
const ID_THEME_BASE: u16 = 1200;

/// Commands produced by tray menu interactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayCommand {
    SelectRunner(Runner),
    SelectTheme(Theme),
    Quit,
}

impl TrayCommand {
    #[cfg(any(windows, test))]
    pub fn menu_id(self) -> u16 {
        match self {
            TrayCommand::Quit => ID_QUIT,
            TrayCommand::SelectRunner(r) => {
                ID_RUNNER_BASE + Runner::ALL.iter().position(|&x| x == r).unwrap_or(0) as u16
            }
            TrayCommand::SelectTheme(t) => {
                ID_THEME_BASE + Theme::ALL.iter().position(|&x| x == t).unwrap_or(0) as u16
            }
        }
    }

    pub fn from_menu_id(id: u16) -> Option<Self> {
        if id == ID_QUIT {
            return Some(TrayCommand::Quit);
        }
        if let Some(i) = id.checked_sub(ID_RUNNER_BASE) {
            if let Some(&r) = Runner::ALL.get(i as usize) {
                return Some(TrayCommand::SelectRunner(r));
            }
        }
        if let Some(i) = id.checked_sub(ID_THEME_BASE) {
            if let Some(&t) = Theme::ALL.get(i as usize) {
                return Some(TrayCommand::SelectTheme(t));
            }
        }
        None
    }

    /// The selection this command switches to, or `None` for non-selection commands.
    pub fn apply_to(self, current: Selection) -> Option<Selection> {
        match self {
            TrayCommand::SelectRunner(r) => Some(current.with_runner(r)),
            TrayCommand::SelectTheme(t) => Some(current.with_theme(t)),
            TrayCommand::Quit => None,
        }
    }
}

#[cfg(windows)]
thread_local! {
    /// Where the window procedure sends menu commands.
    static COMMAND_PROXY: RefCell<Option<EventLoopProxy<AppEvent>>> = const { RefCell::new(None) };
    /// Selection to check-mark when the menu opens.
    static MENU_SELECTION: Cell<Selection> = Cell::new(Selection::default());
}

/// System tray icon state.
pub struct TrayIcon {
    #[cfg(windows)]
    hwnd: HWND,
    #[cfg(windows)]
    nid: NOTIFYICONDATAW,
    #[cfg(windows)]
    sprites: SpriteSheet<HICON>,
    #[cfg(not(windows))]
    sprites: SpriteSheet<std::path::PathBuf>,
    /// Shown when the current selection has no frame at the playback index.
    #[cfg(windows)]
    placeholder: HICON,
    #[cfg(not(windows))]
    placeholder: std::path::PathBuf,
    /// (selection, frame, tooltip) last pushed to the shell.
    shown: Option<(Selection, usize, String)>,
    removed: bool,
}

#[cfg(windows)]
impl TrayIcon {
    pub fn new(
        proxy: EventLoopProxy<AppEvent>,
        selection: Selection,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        COMMAND_PROXY.with(|p| *p.borrow_mut() = Some(proxy));
        MENU_SELECTION.with(|s| s.set(selection));

        unsafe {
            // Register a hidden window class for receiving tray messages.
            let class_name = win32::wide("RunNekoTrayClass");
            let wc = WNDCLASSW {
                style: CS_HREDRAW | CS_VREDRAW,
                lpfnWndProc: Some(tray_wnd_proc),
                lpszClassName: windows::core::PCWSTR(class_name.as_ptr()),
                ..Default::default()
            };
            RegisterClassW(&wc);

            // Hidden window; its messages are pumped by the winit event loop
            // running on this same thread.
            use windows::Win32::Foundation::HINSTANCE;
            let hwnd = CreateWindowExW(
                WS_EX_TOOLWINDOW,
                windows::core::PCWSTR(class_name.as_ptr()),
                windows::core::PCWSTR::null(),
                Default::default(),
                0,
                0,
                0,
                0,
                HWND::default(),
                HMENU::default(),
                HINSTANCE::default(),
                None,
            )?;

            let mut nid = NOTIFYICONDATAW::default();
            nid.cbSize = std::mem::size_of::<NOTIFYICONDATAW>() as u32;
            nid.hWnd = hwnd;
            nid.uID = 1;
            nid.uFlags = NIF_ICON | NIF_MESSAGE | NIF_TIP;
            nid.uCallbackMessage = WM_TRAYICON;

            // Placeholder until the first sprite frame is shown.
            let placeholder = LoadIconW(None, IDI_APPLICATION).unwrap_or_default();
            nid.hIcon = placeholder;
            set_tip(&mut nid, "run-neko");

            if let Err(e) = Shell_NotifyIconW(NIM_ADD, &nid).ok() {
                let _ = DestroyWindow(hwnd);
                COMMAND_PROXY.with(|p| p.borrow_mut().take());
                return Err(e.into());
            }

            log::info!("System tray icon created");

            Ok(Self {
                hwnd,
                nid,
                sprites: SpriteSheet::empty(),
                placeholder,
                shown: None,
                removed: false,
            })
        }
    }

    /// Replace the loaded frames with those of `selection`.
    /// Returns how many frames were actually loaded.
    pub fn load_sprites(&mut self, dir: &Path, selection: Selection) -> usize {
        // The shell may still point at one of the frames about to be destroyed.
        self.nid.hIcon = self.placeholder;
        for icon in self.sprites.drain() {
            win32::destroy_icon(icon);
        }
        self.sprites = SpriteSheet::load_with(dir, selection, win32::load_icon_file);
        if self.sprites.is_empty() {
            log::warn!("No sprite frames in {}, showing placeholder icon", dir.display());
        }
        self.shown = None;
        MENU_SELECTION.with(|s| s.set(selection));
        self.sprites.len()
    }

    /// Push the current frame and tooltip to the shell if either changed.
    pub fn present(&mut self, state: &PlaybackState) {
        let tip = state.load_text();
        let key = (state.selection(), state.frame_index(), tip);
        if self.removed || self.shown.as_ref() == Some(&key) {
            return;
        }

        self.nid.hIcon = *self.sprites.frame_or(state.frame_index(), &self.placeholder);
        set_tip(&mut self.nid, &key.2);
        self.nid.uFlags = NIF_ICON | NIF_TIP;

        unsafe {
            if !Shell_NotifyIconW(NIM_MODIFY, &self.nid).as_bool() {
                log::warn!("Failed to update tray icon ({})", state.asset_key());
            }
        }
        self.shown = Some(key);
    }

    /// Remove the tray icon (called on shutdown).
    pub fn remove(&mut self) {
        if self.removed {
            return;
        }
        self.removed = true;
        unsafe {
            let _ = Shell_NotifyIconW(NIM_DELETE, &self.nid);
            let _ = DestroyWindow(self.hwnd);
        }
        for icon in self.sprites.drain() {
            win32::destroy_icon(icon);
        }
        COMMAND_PROXY.with(|p| p.borrow_mut().take());
        log::info!("System tray icon removed");
    }
}

#[cfg(windows)]
impl Drop for TrayIcon {
    fn drop(&mut self) {
        self.remove();
    }
}

/// Copy `text` into the fixed-size tooltip buffer, truncating if needed.
#[cfg(windows)]
fn set_tip(nid: &mut NOTIFYICONDATAW, text: &str) {
    nid.szTip = [0; 128];
    for (i, ch) in text.encode_utf16().enumerate() {
        if i >= nid.szTip.len() - 1 {
            break;
        }
        nid.szTip[i] = ch;
    }
}

/// Window procedure for the hidden tray message window.
#[cfg(windows)]
unsafe extern "system" fn tray_wnd_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    if msg == WM_TRAYICON {
        let event = (lparam.0 & 0xFFFF) as u32;
        // WM_LBUTTONUP = 0x0202, WM_RBUTTONUP = 0x0205
        if event == 0x0202 || event == 0x0205 {
            show_context_menu(hwnd);
            return LRESULT(0);
        }
    }
    if msg == WM_COMMAND {
        let id = (wparam.0 & 0xFFFF) as u16;
        if let Some(cmd) = TrayCommand::from_menu_id(id) {
            COMMAND_PROXY.with(|p| {
                if let Some(proxy) = p.borrow().as_ref() {
                    if proxy.send_event(AppEvent::Tray(cmd)).is_err() {
                        log::warn!("Event loop closed, dropping {cmd:?}");
                    }
                }
            });
        }
        return LRESULT(0);
    }
    if msg == WM_DESTROY {
        return LRESULT(0);
    }
    DefWindowProcW(hwnd, msg, wparam, lparam)
}

/// Show the context menu at the cursor position.
#[cfg(windows)]
unsafe fn show_context_menu(hwnd: HWND) {
    let Ok(hmenu) = CreatePopupMenu() else {
        log::warn!("Failed to create tray menu");
        return;
    };
    let selection = MENU_SELECTION.with(|s| s.get());

    let checked = |on: bool| if on { MF_CHECKED } else { MF_UNCHECKED };

    if let Ok(runner_menu) = CreatePopupMenu() {
        for r in Runner::ALL {
            let label = win32::wide(r.label());
            let _ = AppendMenuW(
                runner_menu,
                MF_STRING | checked(r == selection.runner),
                TrayCommand::SelectRunner(r).menu_id() as usize,
                windows::core::PCWSTR(label.as_ptr()),
            );
        }
        let label = win32::wide("Runner");
        let _ = AppendMenuW(
            hmenu,
            MF_POPUP,
            runner_menu.0 as usize,
            windows::core::PCWSTR(label.as_ptr()),
        );
    }

    if let Ok(theme_menu) = CreatePopupMenu() {
        for t in Theme::ALL {
            let label = win32::wide(t.label());
            let _ = AppendMenuW(
                theme_menu,
                MF_STRING | checked(t == selection.theme),
                TrayCommand::SelectTheme(t).menu_id() as usize,
                windows::core::PCWSTR(label.as_ptr()),
            );
        }
        let label = win32::wide("Theme");
        let _ = AppendMenuW(
            hmenu,
            MF_POPUP,
            theme_menu.0 as usize,
            windows::core::PCWSTR(label.as_ptr()),
        );
    }

    let _ = AppendMenuW(hmenu, MF_SEPARATOR, 0, windows::core::PCWSTR::null());

    let quit_label = win32::wide("Quit");
    let _ = AppendMenuW(
        hmenu,
        MF_STRING,
        ID_QUIT as usize,
        windows::core::PCWSTR(quit_label.as_ptr()),
    );

    let mut pt = windows::Win32::Foundation::POINT::default();
    let _ = GetCursorPos(&mut pt);

    // Required so menu closes when clicking outside
    let _ = SetForegroundWindow(hwnd);

    let _ = TrackPopupMenu(
        hmenu,
        TPM_LEFTALIGN | TPM_BOTTOMALIGN,
        pt.x,
        pt.y,
        0,
        hwnd,
        None,
    );

    // Also destroys the attached submenus.
    let _ = DestroyMenu(hmenu);
}

// Non-windows stub: resolves frames on disk and logs what would be shown.
#[cfg(not(windows))]
impl TrayIcon {
    pub fn new(
        _proxy: EventLoopProxy<AppEvent>,
        _selection: Selection,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        log::info!("No tray backend on this platform; frames are logged at trace level");
        Ok(Self {
            sprites: SpriteSheet::empty(),
            placeholder: std::path::PathBuf::new(),
            shown: None,
            removed: false,
        })
    }

    pub fn load_sprites(&mut self, dir: &Path, selection: Selection) -> usize {
        self.sprites =
            SpriteSheet::load_with(dir, selection, |p| p.is_file().then(|| p.to_path_buf()));
        if self.sprites.is_empty() {
            log::warn!("No sprite frames in {}", dir.display());
        }
        self.shown = None;
        self.sprites.len()
    }

    pub fn present(&mut self, state: &PlaybackState) {
        let key = (state.selection(), state.frame_index(), state.load_text());
        if self.removed || self.shown.as_ref() == Some(&key) {
            return;
        }
        let path = self.sprites.frame_or(state.frame_index(), &self.placeholder);
        log::trace!("{} [{}] {}", state.asset_key(), path.display(), key.2);
        self.shown = Some(key);
    }

    pub fn remove(&mut self) {
        self.removed = true;
    }
}
