use std::collections::HashMap;
use tennis_api::{Match, MatchStatus, PhaseMatches, PlayerId};
use tui::buffer::Buffer;
use tui::layout::Rect;
use tui::style::{Color, Modifier, Style};
use tui::widgets::Widget;

/// Rows per match cell: player 1, score/status line, player 2.
pub const MATCH_HEIGHT: u16 = 3;

/// Blank columns between two phase columns.
const COLUMN_GAP: u16 = 3;

const CELL_W_MIN: u16 = 18;
const CELL_W_MAX: u16 = 28;

/// Completed and scheduled matches laid out one column per phase, in bracket
/// order from left to right.
pub struct PhaseBoard<'a> {
    pub phases: &'a [PhaseMatches],
    /// Player names known from the roster and rankings; ids are shown otherwise.
    pub names: &'a HashMap<PlayerId, String>,
    /// Phase to emphasise, usually the one last chosen in the match form.
    pub highlight: Option<&'a str>,
}

impl PhaseBoard<'_> {
    fn name(&self, id: PlayerId) -> String {
        self.names
            .get(&id)
            .cloned()
            .unwrap_or_else(|| format!("Player #{id}"))
    }

    fn cell_width(&self, area: Rect) -> u16 {
        let columns = self.phases.len().max(1) as u16;
        let available = area.width.saturating_sub(COLUMN_GAP * (columns - 1)) / columns;
        available.clamp(CELL_W_MIN, CELL_W_MAX)
    }
}

impl Widget for PhaseBoard<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width < CELL_W_MIN || area.height < MATCH_HEIGHT + 1 {
            return;
        }
        if self.phases.is_empty() {
            buf.set_string(
                area.x,
                area.y,
                "No matches recorded yet",
                Style::default().fg(Color::DarkGray),
            );
            return;
        }

        let cell_w = self.cell_width(area);
        let right = area.x + area.width;
        let bottom = area.y + area.height;

        for (col, phase) in self.phases.iter().enumerate() {
            let x = area.x + col as u16 * (cell_w + COLUMN_GAP);
            if x + cell_w > right {
                // Columns that do not fit are summarised in the last visible slot.
                let hidden = self.phases.len() - col;
                let note = format!("+{hidden} more phase(s)");
                let x = right.saturating_sub(note.len() as u16);
                buf.set_string(x, area.y, note, Style::default().fg(Color::DarkGray));
                break;
            }

            let highlighted = self.highlight == Some(phase.phase_name.as_str());
            let header_style = if highlighted {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD)
            };
            let header = clip(&format!("{} ({})", phase.phase_name, phase.matches.len()), cell_w);
            buf.set_string(x, area.y, header, header_style);

            let mut y = area.y + 1;
            for (shown, m) in phase.matches.iter().enumerate() {
                if y + MATCH_HEIGHT > bottom {
                    let left = phase.matches.len() - shown;
                    if y < bottom {
                        buf.set_string(x, y, clip(&format!("... {left} more"), cell_w), Style::default().fg(Color::DarkGray));
                    }
                    break;
                }
                self.draw_match(m, x, y, cell_w, buf);
                y += MATCH_HEIGHT + 1;
            }
        }
    }
}

impl PhaseBoard<'_> {
    fn draw_match(&self, m: &Match, x: u16, y: u16, width: u16, buf: &mut Buffer) {
        let player_style = |id: PlayerId| {
            if m.winner_id == Some(id) {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            }
        };
        let status = match m.status {
            MatchStatus::Completed => "FNL",
            MatchStatus::InProgress => "LIVE",
            MatchStatus::Scheduled => "SCH",
        };
        let detail = match (&m.score, m.match_date) {
            (Some(score), _) => format!("{status} {score} ct{}", m.court_number),
            (None, Some(date)) => format!("{status} {} ct{}", date.format("%m/%d %H:%M"), m.court_number),
            (None, None) => format!("{status} ct{}", m.court_number),
        };

        buf.set_string(x, y, clip(&self.name(m.player1_id), width), player_style(m.player1_id));
        buf.set_string(x, y + 1, clip(&detail, width), Style::default().fg(Color::DarkGray));
        buf.set_string(x, y + 2, clip(&self.name(m.player2_id), width), player_style(m.player2_id));
    }
}

fn clip(text: &str, width: u16) -> String {
    text.chars().take(width as usize).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(board: PhaseBoard, width: u16, height: u16) -> String {
        let area = Rect::new(0, 0, width, height);
        let mut buf = Buffer::empty(area);
        board.render(area, &mut buf);
        (0..height)
            .map(|y| {
                (0..width)
                    .map(|x| buf[(x, y)].symbol().to_string())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn columns_follow_phase_order_and_names_resolve() {
        let phases = vec![
            PhaseMatches {
                phase_name: "Round of 16".into(),
                matches: vec![Match {
                    player1_id: 1,
                    player2_id: 2,
                    winner_id: Some(1),
                    score: Some("6-4 6-3".into()),
                    status: MatchStatus::Completed,
                    ..Default::default()
                }],
            },
            PhaseMatches { phase_name: "Final".into(), matches: vec![] },
        ];
        let names = HashMap::from([(1, "Sinner".to_string())]);
        let text = rendered(PhaseBoard { phases: &phases, names: &names, highlight: None }, 60, 6);

        let first_line = text.lines().next().unwrap();
        assert!(first_line.find("Round of 16").unwrap() < first_line.find("Final").unwrap());
        assert!(text.contains("Sinner"));
        assert!(text.contains("Player #2"));
        assert!(text.contains("FNL 6-4 6-3"));
    }

    #[test]
    fn empty_board_says_so() {
        let names = HashMap::new();
        let text = rendered(PhaseBoard { phases: &[], names: &names, highlight: None }, 30, 5);
        assert!(text.contains("No matches recorded yet"));
    }
}
