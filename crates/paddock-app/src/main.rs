//! Paddock - Main Application Entry Point
//!
//! Hosts one window with a thin chrome bar on top and one guest
//! webview pane per configured site below it. The chrome webview is
//! trusted UI; guest panes are untrusted third-party sites governed by
//! the navigation policy. Pane switching is done by resizing: the
//! active pane fills the content area, inactive panes are zero-sized.

mod channel;
mod governor;
mod ipc;
mod state;

use std::sync::{Arc, Mutex};

use paddock_core::types::{BlockedNavigation, NavigationKind, PaneId, SiteConfig};
use tao::{
    dpi::{LogicalPosition, LogicalSize},
    event::{Event, WindowEvent},
    event_loop::{ControlFlow, EventLoopBuilder},
    window::{Window, WindowBuilder},
};
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;
use wry::{Rect, WebView, WebViewBuilder};

use governor::NavigationDecision;
use ipc::IpcMessage;
use state::AppState;

/// Height of the chrome pane strip
const CHROME_HEIGHT: f64 = 40.0;

/// The HTML content for the chrome pane strip
const CHROME_HTML: &str = include_str!("ui/chrome.html");

/// A live guest pane
struct Pane {
    id: PaneId,
    key: String,
    title: String,
    webview: WebView,
}

/// User events for cross-WebView communication
#[derive(Debug, Clone)]
enum UserEvent {
    PaneLoadFinished { pane_id: PaneId, url: String },
    NavigatePane { pane_id: PaneId, url: String },
    NavigationBlocked(BlockedNavigation),
    UpdateTitle { pane_id: PaneId, title: String },
    ActivatePane { key: String },
}

fn chrome_bounds(window: &Window) -> Rect {
    let size = window.inner_size();
    let scale = window.scale_factor();
    let width = size.width as f64 / scale;
    Rect {
        position: LogicalPosition::new(0.0, 0.0).into(),
        size: LogicalSize::new(width, CHROME_HEIGHT).into(),
    }
}

fn pane_bounds(window: &Window, active: bool) -> Rect {
    let size = window.inner_size();
    let scale = window.scale_factor();
    let width = size.width as f64 / scale;
    let height = size.height as f64 / scale;
    if active {
        Rect {
            position: LogicalPosition::new(0.0, CHROME_HEIGHT).into(),
            size: LogicalSize::new(width, (height - CHROME_HEIGHT).max(0.0)).into(),
        }
    } else {
        // Inactive panes stay alive but occupy no space
        Rect {
            position: LogicalPosition::new(0.0, CHROME_HEIGHT).into(),
            size: LogicalSize::new(0.0, 0.0).into(),
        }
    }
}

fn apply_layout(window: &Window, chrome: &WebView, panes: &[Pane], active_index: usize) {
    let _ = chrome.set_bounds(chrome_bounds(window));
    for (index, pane) in panes.iter().enumerate() {
        let _ = pane.webview.set_bounds(pane_bounds(window, index == active_index));
    }
}

fn sync_panes_to_chrome(chrome: &WebView, panes: &[Pane], active_index: usize) {
    let infos: Vec<ipc::PaneInfo> = panes
        .iter()
        .enumerate()
        .map(|(index, pane)| ipc::PaneInfo {
            key: pane.key.clone(),
            title: pane.title.clone(),
            is_active: index == active_index,
        })
        .collect();
    let _ = chrome.evaluate_script(&ipc::sync_panes_script(&infos));
}

fn set_pane_active_script(active: bool) -> String {
    format!(
        "if (window.__paddockSetPaneActive) {{ window.__paddockSetPaneActive({}); }}",
        active
    )
}

fn main() {
    // Initialize logging with log compatibility
    tracing_log::LogTracer::init().expect("Failed to set log tracer");
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set subscriber");

    info!("Starting Paddock...");

    // Initialize application state
    let state = match AppState::with_defaults() {
        Ok(s) => Arc::new(Mutex::new(s)),
        Err(e) => {
            error!("Failed to initialize app state: {}", e);
            panic!("Failed to initialize app state: {}", e);
        }
    };

    let (sites, window_width, window_height): (Vec<SiteConfig>, f64, f64) = {
        let s = state.lock().unwrap();
        (
            s.policy.sites().to_vec(),
            s.config.window_width,
            s.config.window_height,
        )
    };
    if sites.is_empty() {
        warn!("No sites configured; add entries to sites.json in the data directory");
    }

    // Create the event loop with custom user events
    let event_loop = EventLoopBuilder::<UserEvent>::with_user_event().build();
    let proxy = event_loop.create_proxy();

    let window = WindowBuilder::new()
        .with_title("Paddock")
        .with_inner_size(LogicalSize::new(window_width, window_height))
        .build(&event_loop)
        .expect("Failed to create window");

    let main_window_id = window.id();
    info!("Window created successfully");

    // === CHROME WEBVIEW (pane strip + notices) ===
    let chrome_state = Arc::clone(&state);
    let chrome_proxy = proxy.clone();
    let chrome_webview = WebViewBuilder::new()
        .with_html(CHROME_HTML)
        .with_devtools(cfg!(debug_assertions))
        .with_bounds(chrome_bounds(&window))
        .with_ipc_handler(move |message| {
            let body = message.body();
            match serde_json::from_str::<IpcMessage>(body) {
                Ok(IpcMessage::ActivatePane { key }) => {
                    let _ = chrome_proxy.send_event(UserEvent::ActivatePane { key });
                }
                Ok(IpcMessage::AddWhitelistEntry { key, url }) => {
                    if let Ok(s) = chrome_state.lock() {
                        if let Err(err) = s.policy.add_whitelist_entry(&key, &url) {
                            error!("Failed to add whitelist entry: {}", err);
                        }
                    }
                }
                Ok(IpcMessage::RemoveWhitelistEntry { key, url }) => {
                    if let Ok(s) = chrome_state.lock() {
                        if let Err(err) = s.policy.remove_whitelist_entry(&key, &url) {
                            error!("Failed to remove whitelist entry: {}", err);
                        }
                    }
                }
                Ok(IpcMessage::Log { level, message }) => match level.as_str() {
                    "error" => error!("[chrome] {}", message),
                    "warn" => warn!("[chrome] {}", message),
                    _ => info!("[chrome] {}", message),
                },
                Err(e) => {
                    error!("Failed to parse chrome IPC: {}", e);
                }
            }
        })
        .build_as_child(&window)
        .expect("Failed to create chrome WebView");

    // === GUEST PANES (one per configured site) ===
    let mut panes: Vec<Pane> = Vec::new();
    for (index, site) in sites.iter().enumerate() {
        let pane_id = {
            let mut s = state.lock().unwrap();
            s.register_pane()
        };

        let nav_state = Arc::clone(&state);
        let nav_proxy = proxy.clone();
        let popup_state = Arc::clone(&state);
        let popup_proxy = proxy.clone();
        let load_proxy = proxy.clone();
        let title_proxy = proxy.clone();
        let channel_state = Arc::clone(&state);
        let channel_proxy = proxy.clone();

        let webview = WebViewBuilder::new()
            .with_url(&site.url)
            .with_devtools(cfg!(debug_assertions))
            .with_bounds(pane_bounds(&window, index == 0))
            .with_navigation_handler(move |target| {
                let decision = match nav_state.lock() {
                    Ok(s) => governor::decide_navigation(
                        &s,
                        pane_id,
                        &target,
                        NavigationKind::FullNavigation,
                    ),
                    Err(_) => NavigationDecision::Allow,
                };
                match decision {
                    NavigationDecision::Allow => true,
                    NavigationDecision::Block(notice) => {
                        info!("Navigation blocked for pane {:?}: {}", pane_id, notice.blocked_url);
                        let _ = nav_proxy.send_event(UserEvent::NavigationBlocked(notice));
                        false
                    }
                }
            })
            .with_new_window_req_handler(move |target| {
                // Inline documents used by verification widgets render
                // in place
                if target == "about:blank" || target == "about:srcdoc" {
                    return true;
                }
                let decision = match popup_state.lock() {
                    Ok(s) => governor::decide_navigation(
                        &s,
                        pane_id,
                        &target,
                        NavigationKind::WindowOpen,
                    ),
                    Err(_) => NavigationDecision::Allow,
                };
                match decision {
                    NavigationDecision::Allow => {
                        // Popups stay contained: route the target into the
                        // originating pane instead of a new window
                        info!("New window request -> pane {:?}: {}", pane_id, target);
                        let _ = popup_proxy.send_event(UserEvent::NavigatePane {
                            pane_id,
                            url: target,
                        });
                        false
                    }
                    NavigationDecision::Block(notice) => {
                        info!("New window request blocked: {}", notice.blocked_url);
                        let _ = popup_proxy.send_event(UserEvent::NavigationBlocked(notice));
                        false
                    }
                }
            })
            .with_on_page_load_handler(move |event, url| {
                if let wry::PageLoadEvent::Finished = event {
                    let _ = load_proxy.send_event(UserEvent::PaneLoadFinished {
                        pane_id,
                        url: url.to_string(),
                    });
                }
            })
            .with_document_title_changed_handler(move |title| {
                let _ = title_proxy.send_event(UserEvent::UpdateTitle { pane_id, title });
            })
            .with_ipc_handler(move |message| {
                let body = message.body();
                let notice = match channel_state.lock() {
                    Ok(mut s) => governor::handle_channel_message(&mut s, pane_id, body),
                    Err(_) => None,
                };
                if let Some(notice) = notice {
                    let _ = channel_proxy.send_event(UserEvent::NavigationBlocked(notice));
                }
            })
            .build_as_child(&window)
            .expect("Failed to create pane WebView");

        info!("Created pane {:?} for site {}", pane_id, site.key);
        panes.push(Pane {
            id: pane_id,
            key: site.key.clone(),
            title: site.title.clone(),
            webview,
        });
    }

    let mut active_index: usize = 0;
    sync_panes_to_chrome(&chrome_webview, &panes, active_index);

    let state_for_events = Arc::clone(&state);

    // Run the event loop
    event_loop.run(move |event, _event_loop_target, control_flow| {
        *control_flow = ControlFlow::Wait;

        match event {
            Event::WindowEvent {
                event: WindowEvent::CloseRequested,
                window_id,
                ..
            } => {
                if window_id == main_window_id {
                    info!("Main window close requested, shutting down...");
                    *control_flow = ControlFlow::Exit;
                }
            }
            Event::WindowEvent {
                event: WindowEvent::Resized(_),
                ..
            } => {
                apply_layout(&window, &chrome_webview, &panes, active_index);
            }
            Event::WindowEvent {
                event: WindowEvent::Focused(focused),
                window_id,
                ..
            } => {
                // Pause or resume media in the foreground pane when the
                // whole window changes focus
                if window_id == main_window_id {
                    if let Some(pane) = panes.get(active_index) {
                        let _ = pane
                            .webview
                            .evaluate_script(&set_pane_active_script(focused));
                    }
                }
            }
            Event::UserEvent(user_event) => match user_event {
                UserEvent::PaneLoadFinished { pane_id, url } => {
                    info!("Pane {:?} finished loading {}", pane_id, url);
                    let modules = match state_for_events.lock() {
                        Ok(mut s) => governor::on_load_finished(&mut s, pane_id, &url),
                        Err(_) => Vec::new(),
                    };
                    if let Some(pane) = panes.iter().find(|p| p.id == pane_id) {
                        // Modules are injected independently so a failure
                        // in one cannot disable the others
                        for module in modules {
                            if let Err(err) = pane.webview.evaluate_script(&module.source) {
                                warn!("Failed to inject {} module: {}", module.name, err);
                            }
                        }
                    }
                }
                UserEvent::NavigatePane { pane_id, url } => {
                    if let Some(pane) = panes.iter().find(|p| p.id == pane_id) {
                        let _ = pane.webview.load_url(&url);
                    }
                }
                UserEvent::NavigationBlocked(notice) => {
                    let _ = chrome_webview.evaluate_script(&ipc::blocked_notice_script(&notice));
                }
                UserEvent::UpdateTitle { pane_id, title } => {
                    let trimmed = title.trim();
                    if trimmed.is_empty() {
                        return;
                    }
                    if let Ok(mut s) = state_for_events.lock() {
                        let context = s.binding_mut(pane_id).map(|binding| {
                            binding.last_title = Some(trimmed.to_string());
                            (binding.site_key.clone(), binding.current_url.clone())
                        });
                        // Titles arrive after the append; backfill the
                        // logged entry once the document settles on one
                        if let Some((Some(key), Some(url))) = context {
                            if s.policy.snapshot(&key).logging_enabled() {
                                if let Err(err) = s.history.set_title(&key, &url, trimmed) {
                                    warn!("Failed to update history title: {}", err);
                                }
                            }
                        }
                    }
                    if let Some(pane) = panes.iter_mut().find(|p| p.id == pane_id) {
                        pane.title = trimmed.to_string();
                    }
                    sync_panes_to_chrome(&chrome_webview, &panes, active_index);
                }
                UserEvent::ActivatePane { key } => {
                    if let Some(next_index) = panes.iter().position(|p| p.key == key) {
                        if next_index != active_index {
                            if let Some(old) = panes.get(active_index) {
                                let _ = old
                                    .webview
                                    .evaluate_script(&set_pane_active_script(false));
                            }
                            active_index = next_index;
                            if let Some(new) = panes.get(active_index) {
                                let _ = new
                                    .webview
                                    .evaluate_script(&set_pane_active_script(true));
                                let _ = new.webview.focus();
                            }
                            apply_layout(&window, &chrome_webview, &panes, active_index);
                            sync_panes_to_chrome(&chrome_webview, &panes, active_index);
                        }
                    }
                }
            },
            _ => {}
        }
    });
}
