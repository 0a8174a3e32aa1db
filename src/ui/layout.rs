use tui::layout::{Constraint, Layout, Rect, Size};
pub const TAB_BAR_HEIGHT: u16 = 3;

/// Rows given to the log pane when it is shown.
pub const LOG_PANE_HEIGHT: u16 = 10;

/// Pre-computed layout areas for the main draw loop.
pub struct LayoutAreas {
    pub tab_bar: [Rect; 2],
    pub main: Rect,
    pub logs: Option<Rect>,
}

impl LayoutAreas {
    pub fn new(size: Size) -> Self {
        let rect = Rect::new(0, 0, size.width, size.height);
        Self::from_rect(rect, false, false)
    }

    pub fn update(&mut self, area: Rect, full_screen: bool, show_logs: bool) {
        *self = Self::from_rect(area, full_screen, show_logs);
    }

    fn from_rect(area: Rect, full_screen: bool, show_logs: bool) -> Self {
        let (tab_bar, body) = if full_screen {
            let [body] = Layout::vertical([Constraint::Fill(1)]).areas(area);
            ([Rect::ZERO, Rect::ZERO], body)
        } else {
            let [tab, body] =
                Layout::vertical([Constraint::Length(TAB_BAR_HEIGHT), Constraint::Fill(1)])
                    .areas(area);
            (Self::split_tab_bar(tab), body)
        };

        if !show_logs || body.height <= LOG_PANE_HEIGHT * 2 {
            return LayoutAreas { tab_bar, main: body, logs: None };
        }
        let [main, logs] =
            Layout::vertical([Constraint::Fill(1), Constraint::Length(LOG_PANE_HEIGHT)])
                .areas(body);
        LayoutAreas { tab_bar, main, logs: Some(logs) }
    }

    /// Tabs on the left, the session label on the right.
    fn split_tab_bar(area: Rect) -> [Rect; 2] {
        Layout::horizontal([Constraint::Percentage(65), Constraint::Percentage(35)]).areas(area)
    }
}

/// A `width` x `height` rectangle centred in `area`, shrunk to fit.
pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_pane_only_when_room() {
        let mut layout = LayoutAreas::new(Size::new(100, 40));
        layout.update(Rect::new(0, 0, 100, 40), false, true);
        assert_eq!(layout.logs.map(|r| r.height), Some(LOG_PANE_HEIGHT));
        assert_eq!(layout.main.y, TAB_BAR_HEIGHT);

        layout.update(Rect::new(0, 0, 100, 15), false, true);
        assert!(layout.logs.is_none());
    }

    #[test]
    fn centered_popup_fits_inside() {
        let popup = centered(Rect::new(0, 0, 40, 10), 60, 6);
        assert_eq!(popup, Rect::new(0, 2, 40, 6));
    }
}
