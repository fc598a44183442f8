use std::path::Path;
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;
use strum::IntoEnumIterator;
use tracing::debug;

use crate::common::config::DockSettings;
use crate::common::geometry::{Point, Rect};
use crate::layout_engine::{DockLayout, DropLocation};
use crate::model::tree::TreeEvent;

/// What the host application supplies: the set of content panels it can
/// build, the factory that builds one, and naming/notification hooks.
pub trait DockDelegate {
    /// Concrete content handle, whatever the host's UI toolkit uses.
    type View;

    /// Names offered in "add view" menus.
    fn available_view_names(&self) -> Vec<String>;

    /// Builds the content for a named view. Called at most once per live
    /// node id; `None` shows an empty panel.
    fn create_view(&mut self, name: &str) -> Option<Self::View>;

    /// Optional prettier label for a view name.
    fn display_name_for(&self, name: &str) -> String { name.to_owned() }

    fn default_window_name(&self) -> String;

    /// Debounced: fires once a burst of layout edits has settled.
    fn layout_updated(&mut self) {}
}

/// Coalesces a burst of tree changes into one notification. Purely a
/// throttle on the outbound signal; mutations themselves are never gated.
struct UpdateThrottler {
    quiet: Duration,
    deadline: Option<Instant>,
}

impl UpdateThrottler {
    fn new(quiet: Duration) -> Self {
        UpdateThrottler { quiet, deadline: None }
    }

    fn note_at(&mut self, now: Instant) {
        self.deadline = Some(now + self.quiet);
    }

    fn fire_if_quiet(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// Thin orchestration over [`DockLayout`]: view-instance cache, preset
/// layouts, menu content, save/open, and the debounced layout-changed
/// signal. UI layers route every mutation through here (or through
/// [`with_layout`]); nobody edits tree nodes directly.
///
/// [`with_layout`]: DockManager::with_layout
pub struct DockManager<D: DockDelegate> {
    delegate: D,
    data: DockLayout,
    settings: DockSettings,
    views: FxHashMap<String, D::View>,
    throttler: UpdateThrottler,
}

impl<D: DockDelegate> DockManager<D> {
    pub fn new(delegate: D) -> Self {
        Self::with_settings(delegate, DockSettings::default())
    }

    pub fn with_settings(delegate: D, settings: DockSettings) -> Self {
        let throttler = UpdateThrottler::new(Duration::from_millis(settings.update_quiet_ms));
        DockManager {
            delegate,
            data: DockLayout::new(),
            settings,
            views: FxHashMap::default(),
            throttler,
        }
    }

    pub fn layout(&self) -> &DockLayout { &self.data }

    pub fn delegate(&self) -> &D { &self.delegate }

    /// Runs an arbitrary engine operation, then reconciles the view cache
    /// and notification state with whatever changed.
    pub fn with_layout<R>(&mut self, f: impl FnOnce(&mut DockLayout) -> R) -> R {
        let result = f(&mut self.data);
        self.sync();
        result
    }

    // ------------------------------------------------------------------
    // Operations forwarded to the engine
    // ------------------------------------------------------------------

    pub fn open_view_in_new_window(&mut self, view_name: &str, bounds: Rect) {
        let bounds = if bounds.is_empty() { self.settings.default_window_bounds } else { bounds };
        self.data.create_in_new_window(view_name, bounds);
        self.sync();
    }

    pub fn open_view_as_new_tab(
        &mut self,
        view_name: &str,
        pattern: &str,
        fallback: DropLocation,
    ) {
        self.data.open_view_as_new_tab(view_name, pattern, fallback);
        self.sync();
    }

    pub fn show_view(&mut self, view_name: &str) -> bool {
        let shown = self.data.show_view(view_name);
        self.sync();
        shown
    }

    pub fn remove_view(&mut self, view_id: &str) {
        self.data.remove_view(view_id);
        self.sync();
    }

    /// Drag-and-drop: re-dock an existing node relative to another.
    pub fn dock_view(
        &mut self,
        view_id: &str,
        target_id: &str,
        location: DropLocation,
        drop_position: Point,
        tab_index: Option<usize>,
    ) {
        self.data.dock_view(view_id, target_id, location, drop_position, tab_index);
        self.sync();
    }

    /// Menu action: tear a node out into its own floating window.
    pub fn open_in_new_window(&mut self, id: &str, position: Point) {
        self.data.open_in_new_window(id, position);
        self.sync();
    }

    /// Menu action: add a named view at a drop location relative to a
    /// reference node. `DropLocation::None` opens a fresh window.
    pub fn add_view_at(&mut self, reference_id: &str, location: DropLocation, view_name: &str) {
        if location == DropLocation::None {
            self.open_view_in_new_window(view_name, Rect::default());
            return;
        }
        self.data.dock_new_view(reference_id, location, view_name);
        self.sync();
    }

    // ------------------------------------------------------------------
    // Save / open
    // ------------------------------------------------------------------

    pub fn save_layout(&self, path: &Path) -> bool { self.data.save_to_file(path) }

    pub fn save_template(&self, path: &Path) -> bool { self.data.save_as_template(path) }

    pub fn open_layout(&mut self, path: &Path) -> bool {
        if !self.data.open_from_file(path) {
            return false;
        }
        // Cached content belongs to the layout that was just replaced.
        self.views.clear();
        self.data.drain_events();
        self.throttler.note_at(Instant::now());
        true
    }

    // ------------------------------------------------------------------
    // View instances
    // ------------------------------------------------------------------

    /// Content for the given node, built once per live id via the
    /// delegate's factory.
    pub fn view_for(&mut self, id: &str, name: &str) -> Option<&D::View> {
        if self.data.node(id).is_none() {
            return None;
        }
        if !self.views.contains_key(id) {
            let view = self.delegate.create_view(name)?;
            self.views.insert(id.to_owned(), view);
        }
        self.views.get(id)
    }

    pub fn has_view_instance(&self, id: &str) -> bool { self.views.contains_key(id) }

    // ------------------------------------------------------------------
    // Menus
    // ------------------------------------------------------------------

    /// Drop locations worth offering for this reference node. Parent-tier
    /// entries only make sense when an ancestor split of the matching
    /// orientation exists.
    pub fn menu_locations(&self, reference_id: &str) -> Vec<DropLocation> {
        DropLocation::iter()
            .filter(|location| {
                !location.is_parent_tier()
                    || self.data.has_split_ancestor(reference_id, location.dock_kind())
            })
            .collect()
    }

    pub fn menu_view_names(&self) -> Vec<(String, String)> {
        self.delegate
            .available_view_names()
            .into_iter()
            .map(|name| {
                let display = self.delegate.display_name_for(&name);
                (name, display)
            })
            .collect()
    }

    // ------------------------------------------------------------------
    // Preset layouts
    // ------------------------------------------------------------------

    pub fn two_up(&mut self, window_name: &str, views: &[&str]) -> String {
        self.columns(window_name, views, 2)
    }

    pub fn three_up(&mut self, window_name: &str, views: &[&str]) -> String {
        self.columns(window_name, views, 3)
    }

    pub fn four_up(&mut self, window_name: &str, views: &[&str]) -> String {
        self.columns(window_name, views, 4)
    }

    pub fn two_rows(&mut self, window_name: &str, views: &[&str]) -> String {
        self.rows(window_name, views, 2)
    }

    pub fn three_rows(&mut self, window_name: &str, views: &[&str]) -> String {
        self.rows(window_name, views, 3)
    }

    /// Two columns of two. Views fill column-major: left top, left bottom,
    /// right top, right bottom.
    pub fn two_by_two(&mut self, window_name: &str, views: &[&str]) -> String {
        self.grid(window_name, views, 2)
    }

    /// Three columns of two, views column-major.
    pub fn three_by_three(&mut self, window_name: &str, views: &[&str]) -> String {
        self.grid(window_name, views, 3)
    }

    fn preset_window(&mut self, window_name: &str) -> (String, String) {
        let name = if window_name.is_empty() {
            self.delegate.default_window_name()
        } else {
            window_name.to_owned()
        };
        self.data.add_new_window(&name, self.settings.default_window_bounds)
    }

    fn columns(&mut self, window_name: &str, views: &[&str], count: usize) -> String {
        let (window_id, root_id) = self.preset_window(window_name);
        for i in 0..count {
            if let Some(name) = clamped(views, i) {
                self.data.dock_new_view(&root_id, DropLocation::RootRight, name);
            }
        }
        self.sync();
        window_id
    }

    fn rows(&mut self, window_name: &str, views: &[&str], count: usize) -> String {
        let (window_id, root_id) = self.preset_window(window_name);
        for i in 0..count {
            if let Some(name) = clamped(views, i) {
                self.data.dock_new_view(&root_id, DropLocation::RootBottom, name);
            }
        }
        self.sync();
        window_id
    }

    fn grid(&mut self, window_name: &str, views: &[&str], columns: usize) -> String {
        let (window_id, root_id) = self.preset_window(window_name);
        let mut tops = Vec::with_capacity(columns);
        for col in 0..columns {
            if let Some(name) = clamped(views, col * 2) {
                tops.push(self.data.dock_new_view(&root_id, DropLocation::RootRight, name));
            }
        }
        for (col, top) in tops.iter().enumerate() {
            if let Some(name) = clamped(views, col * 2 + 1) {
                self.data.dock_new_view(top, DropLocation::ViewBottom, name);
            }
        }
        self.sync();
        window_id
    }

    // ------------------------------------------------------------------
    // Change notification
    // ------------------------------------------------------------------

    /// Host-driven tick. Fires the delegate's `layout_updated` once the
    /// quiet window after the last edit has elapsed.
    pub fn pump(&mut self) {
        if self.throttler.fire_if_quiet(Instant::now()) {
            self.delegate.layout_updated();
        }
    }

    fn sync(&mut self) {
        let events = self.data.drain_events();
        if events.is_empty() {
            return;
        }
        for event in &events {
            if let TreeEvent::NodeDiscarded { id } = event {
                if self.views.remove(id).is_some() {
                    debug!(id = id.as_str(), "dropped cached view instance");
                }
            }
        }
        self.throttler.note_at(Instant::now());
    }
}

fn clamped<'a>(views: &[&'a str], index: usize) -> Option<&'a str> {
    if views.is_empty() {
        return None;
    }
    Some(views[index.min(views.len() - 1)])
}
