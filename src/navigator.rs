//! Cursor navigator: the long-lived half of the engine.
//!
//! Holds the current `CursorSystemData` and the current position, answers
//! "where is the cursor at time T" and "which stop is nearest to this
//! click", and tells the display surface when to jump pages, where to draw
//! the cursor, and when to show the next-page preview.

use tracing::trace;

use crate::error::{CursorError, Result};
use crate::geometry::{distance_squared, CursorRect, Point, ViewGeometry};
use crate::model::{find_position, BoundingBox, CursorStop, CursorSystemData};
use crate::options::NavigatorOptions;

/// Effects the navigator requests from the UI.  The navigator owns none
/// of the visuals; it only tells the surface what to do.
pub trait DisplaySurface {
    /// Scroll so that `page_index` is in view.  Returns false if the
    /// surface could not do it.
    fn jump_to_page(&mut self, page_index: usize) -> bool;

    fn place_cursor(&mut self, rect: CursorRect);

    fn hide_cursor(&mut self);

    /// Show a preview of `next_page` over the second half of
    /// `current_page`.  Returns false if the surface could not do it.
    fn show_page_preview(&mut self, current_page: usize, next_page: usize) -> bool;

    fn hide_page_preview(&mut self);
}

/// What the UI currently shows for the cursor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CursorState {
    /// No current position
    Hidden,
    /// Drawn at `rect` for stop `index`
    Shown { index: usize, rect: CursorRect },
    /// Stop `index` is current but has no drawable box
    Unplaceable { index: usize },
}

pub struct CursorNavigator<D: DisplaySurface> {
    surface: D,
    options: NavigatorOptions,
    data: Option<CursorSystemData>,
    view: ViewGeometry,
    current_position_index: Option<usize>,
    play_mode: bool,
    state: CursorState,
    /// Page currently shown as preview
    preview_page: Option<usize>,
}

impl<D: DisplaySurface> CursorNavigator<D> {
    pub fn new(surface: D, options: NavigatorOptions) -> Self {
        Self {
            surface,
            options,
            data: None,
            view: ViewGeometry::default(),
            current_position_index: None,
            play_mode: false,
            state: CursorState::Hidden,
            preview_page: None,
        }
    }

    /// Swap in a freshly built timeline and the geometry it was built
    /// against.  The current position survives, clamped to the new length
    /// and resolved to a visible stop, and the cursor is redrawn without
    /// forcing a page jump.  With no visible stop left the position is
    /// dropped.
    pub fn set_system_data(&mut self, data: CursorSystemData, view: ViewGeometry) {
        let len = data.positions.len();
        self.current_position_index = match self.current_position_index {
            Some(i) if len > 0 => resolve_visible(&data.positions, i.min(len - 1)),
            _ => None,
        };
        self.data = Some(data);
        self.view = view;

        match self.current_position_index {
            Some(index) => {
                if !self.move_to(index, false, true) {
                    self.hide();
                }
            }
            None => self.hide(),
        }
    }

    /// The loaded timeline.  Errors if none was ever loaded.
    pub fn system_data(&self) -> Result<&CursorSystemData> {
        self.data.as_ref().ok_or(CursorError::TimelineNotBuilt)
    }

    pub fn view(&self) -> &ViewGeometry {
        &self.view
    }

    pub fn options(&self) -> &NavigatorOptions {
        &self.options
    }

    pub fn surface(&self) -> &D {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut D {
        &mut self.surface
    }

    pub fn state(&self) -> CursorState {
        self.state
    }

    pub fn current_position_index(&self) -> Option<usize> {
        self.current_position_index
    }

    pub fn current_position(&self) -> Option<&CursorStop> {
        let data = self.data.as_ref()?;
        data.positions.get(self.current_position_index?)
    }

    pub fn is_play_mode(&self) -> bool {
        self.play_mode
    }

    pub fn set_play_mode(&mut self, play_mode: bool) {
        self.play_mode = play_mode;
        if !play_mode {
            self.hide_preview();
        }
    }

    pub fn is_preview_visible(&self) -> bool {
        self.preview_page.is_some()
    }

    /// Move to the last stop starting at or before `time`.
    ///
    /// Returns that stop, or `None` (and does nothing) when `time`
    /// precedes the first stop.  A hidden stop is displayed via its
    /// nearest visible neighbour.
    pub fn set_time(&mut self, time: f64) -> Result<Option<&CursorStop>> {
        let data = self.system_data()?;
        let Some(found) = find_position(&data.positions, time) else {
            return Ok(None);
        };
        self.move_to(found, false, false);
        Ok(self.data.as_ref().and_then(|d| d.positions.get(found)))
    }

    /// Jump straight to stop `index`.  Out-of-range indices are ignored.
    /// Returns the stop now displayed.
    pub fn set_position_index(&mut self, index: usize, force_jump: bool) -> Result<Option<&CursorStop>> {
        let data = self.system_data()?;
        if index >= data.positions.len() {
            return Ok(None);
        }
        if !self.move_to(index, force_jump, false) {
            return Ok(None);
        }
        Ok(self.current_position())
    }

    /// Move to the stop nearest to a click in container coordinates.
    /// Random-access clicks never force a page jump.
    pub fn on_click(&mut self, point: Point) -> Result<Option<&CursorStop>> {
        let Some(target) = self.hit_test(point)? else {
            return Ok(None);
        };
        if !self.move_to(target, false, false) {
            return Ok(None);
        }
        Ok(self.current_position())
    }

    /// Index of the stop nearest to `point` among the stops on the page
    /// under the click's x coordinate.
    pub fn hit_test(&self, point: Point) -> Result<Option<usize>> {
        let data = self.system_data()?;
        let Some(page) = self.view.page_at_x(point.x) else {
            return Ok(None);
        };
        let Some(local) = self.view.to_page_local(page, point) else {
            return Ok(None);
        };

        let mut best: Option<(usize, f64)> = None;
        for stop in &data.positions {
            let Some(stop_page) = stop.page_index else {
                continue;
            };
            // Stops are time ordered, hence page ordered.
            if stop_page > page {
                break;
            }
            if stop_page < page {
                continue;
            }
            let distance = distance_squared(&stop.bounding_box, local);
            if best.map_or(distance.is_finite(), |(_, d)| distance < d) {
                best = Some((stop.index, distance));
            }
        }
        Ok(best.map(|(index, _)| index))
    }

    /// The nearest visible stop to `index`: itself if placed, else the
    /// closest placed stop before it, else the closest after it.
    pub fn resolve_visible(&self, index: usize) -> Option<usize> {
        resolve_visible(&self.data.as_ref()?.positions, index)
    }

    /// Forget the current position and hide everything.
    pub fn clear(&mut self) {
        self.current_position_index = None;
        self.hide();
    }

    fn hide(&mut self) {
        if self.state != CursorState::Hidden {
            self.surface.hide_cursor();
        }
        self.state = CursorState::Hidden;
        self.hide_preview();
    }

    fn hide_preview(&mut self) {
        if self.preview_page.take().is_some() {
            self.surface.hide_page_preview();
        }
    }

    /// Make `index` (or its visible substitute) current.  Returns false,
    /// leaving all state untouched, when no visible stop exists.
    fn move_to(&mut self, index: usize, force_jump: bool, redraw: bool) -> bool {
        let Some(resolved) = self.resolve_visible(index) else {
            trace!(index, "no visible stop to move to");
            return false;
        };

        let unchanged = self.current_position_index == Some(resolved) && self.state != CursorState::Hidden;
        if unchanged && !force_jump && !redraw {
            return true;
        }

        // The host may have scrolled on its own, so playback re-requests
        // the page on every move.
        let jump = force_jump || (self.play_mode && !unchanged);
        self.current_position_index = Some(resolved);
        self.update_display(resolved, jump);
        true
    }

    fn update_display(&mut self, index: usize, jump: bool) {
        let Some(stop) = self.data.as_ref().and_then(|d| d.positions.get(index)) else {
            return;
        };
        let Some(page) = stop.page_index else {
            return;
        };
        let system = stop.system_index;
        let bbox: BoundingBox = stop.bounding_box;
        trace!(index, time = stop.time, page, "cursor moved");

        if jump && page < self.view.page_count() && !self.surface.jump_to_page(page) {
            trace!(page, "surface refused page jump");
        }

        match self.view.cursor_rect(page, &bbox, self.options.cursor_y_offset) {
            Some(rect) => {
                self.surface.place_cursor(rect);
                self.state = CursorState::Shown { index, rect };
                self.update_preview(page, system, rect);
            }
            None => {
                if self.state != CursorState::Hidden {
                    self.surface.hide_cursor();
                }
                self.state = CursorState::Unplaceable { index };
                self.hide_preview();
            }
        }
    }

    fn update_preview(&mut self, page: usize, system: Option<usize>, rect: CursorRect) {
        let next = page + 1;
        if self.play_mode && next < self.view.page_count() && self.crossed_preview_line(page, system, rect) {
            if self.preview_page == Some(next) {
                return;
            }
            self.hide_preview();
            if self.surface.show_page_preview(page, next) {
                self.preview_page = Some(next);
            }
            return;
        }
        self.hide_preview();
    }

    /// Single-system pages preview as soon as the midline is crossed;
    /// multi-system pages only once the cursor is in their last system.
    fn crossed_preview_line(&self, page: usize, system: Option<usize>, rect: CursorRect) -> bool {
        let Some(geometry) = self.view.page(page) else {
            return false;
        };
        if rect.x <= geometry.midline_x() + self.options.preview_x_correction {
            return false;
        }
        let systems = self.data.as_ref().map_or(0, |d| d.systems_on_page(page));
        if systems <= 1 {
            return true;
        }
        system == Some(systems - 1)
    }
}

/// See [`CursorNavigator::resolve_visible`].
pub fn resolve_visible(positions: &[CursorStop], index: usize) -> Option<usize> {
    let stop = positions.get(index)?;
    if stop.is_placed() {
        return Some(index);
    }
    positions[..index]
        .iter()
        .rposition(CursorStop::is_placed)
        .or_else(|| {
            positions[index + 1..]
                .iter()
                .position(CursorStop::is_placed)
                .map(|offset| index + 1 + offset)
        })
}
