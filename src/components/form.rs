use crate::state::forms::{FieldKind, Form};
use tui::buffer::Buffer;
use tui::layout::Rect;
use tui::style::{Color, Modifier, Style};
use tui::text::{Line, Span};
use tui::widgets::{Block, BorderType, Borders, Clear, Paragraph, Widget, Wrap};

/// Width of the label column, including the separating space.
const LABEL_WIDTH: usize = 20;

/// Modal editor for a [`Form`]: one line per field, the focused one marked,
/// the validation error (if any) under the fields.
pub struct FormView<'a> {
    pub form: &'a Form,
    /// A submit for this form is in flight.
    pub submitting: bool,
}

impl FormView<'_> {
    /// Rows needed to show the whole form including borders.
    pub fn height(form: &Form) -> u16 {
        // borders + fields + blank + error + hint
        form.fields.len() as u16 + 5
    }
}

impl Widget for FormView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Yellow))
            .title(format!(" {} ", self.form.title));

        let mut lines: Vec<Line> = self
            .form
            .fields
            .iter()
            .enumerate()
            .map(|(idx, field)| {
                let focused = idx == self.form.focus;
                let marker = if focused { "> " } else { "  " };
                let label = format!("{marker}{:<width$}", field.label, width = LABEL_WIDTH - 2);
                let mut value = field.display();
                if focused && !field.is_choice() {
                    value.push('_');
                }
                let value_style = match (&field.kind, focused) {
                    (FieldKind::Date { .. }, _) if field.value.is_empty() => {
                        Style::default().fg(Color::DarkGray)
                    }
                    (_, true) => Style::default().fg(Color::Yellow),
                    _ => Style::default().fg(Color::White),
                };
                let label_style = if focused {
                    Style::default().add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::Gray)
                };
                Line::from(vec![
                    Span::styled(label, label_style),
                    Span::styled(value, value_style),
                ])
            })
            .collect();

        lines.push(Line::from(""));
        match (&self.form.error, self.submitting) {
            (_, true) => lines.push(Line::from(Span::styled(
                "Sending...",
                Style::default().fg(Color::Cyan),
            ))),
            (Some(error), false) => lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            ))),
            (None, false) => lines.push(Line::from("")),
        }
        lines.push(Line::from(Span::styled(
            "Tab/↓ next  ↑ prev  ←/→ choose  Enter submit  Esc cancel",
            Style::default().fg(Color::DarkGray),
        )));

        Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false })
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::forms::EMAIL;

    fn text_of(buf: &Buffer, area: Rect) -> String {
        (area.y..area.y + area.height)
            .map(|y| {
                (area.x..area.x + area.width)
                    .map(|x| buf[(x, y)].symbol().to_string())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn shows_fields_focus_and_error() {
        let mut form = crate::state::forms::Form::login();
        form.push_char('a');
        form.error = Some("Password is required".into());

        let area = Rect::new(0, 0, 70, FormView::height(&form));
        let mut buf = Buffer::empty(area);
        FormView { form: &form, submitting: false }.render(area, &mut buf);
        let text = text_of(&buf, area);

        assert!(text.contains(&format!("> {EMAIL}")));
        assert!(text.contains("a_"));
        assert!(text.contains("Password is required"));
        assert!(text.contains("< team >"));
    }
}
