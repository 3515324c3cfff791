use crate::ui::view::ShortcutInfo;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Draw the header bar with app name, API host and the current view's shortcuts
pub fn draw_header(frame: &mut Frame, area: Rect, title: &str, shortcuts: &[ShortcutInfo]) {
  let mut spans = vec![
    Span::styled(" todo-tui ", Style::default().fg(Color::Cyan).bold()),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    Span::styled(format!(" {} ", title), Style::default().fg(Color::White)),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    Span::raw(" "),
  ];

  spans.extend(shortcut_spans(shortcuts));

  let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
  frame.render_widget(paragraph, area);
}

/// Keys and brackets highlighted, descriptions dimmed, ordered by priority
fn shortcut_spans(shortcuts: &[ShortcutInfo]) -> Vec<Span<'static>> {
  let mut sorted: Vec<&ShortcutInfo> = shortcuts.iter().collect();
  sorted.sort_by_key(|s| s.priority);

  let mut spans = Vec::new();
  for (i, shortcut) in sorted.iter().enumerate() {
    if i > 0 {
      spans.push(Span::raw("  "));
    }
    spans.push(Span::styled(
      format!("<{}>", shortcut.key),
      Style::default().fg(Color::Cyan),
    ));
    spans.push(Span::styled(
      format!(" {}", shortcut.label),
      Style::default().fg(Color::DarkGray),
    ));
  }
  spans
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_shortcuts_sorted_by_priority() {
    let shortcuts = vec![
      ShortcutInfo::new("q", "back").with_priority(30),
      ShortcutInfo::new(":", "command").with_priority(10),
    ];
    let text: String = shortcut_spans(&shortcuts)
      .iter()
      .map(|s| s.content.as_ref())
      .collect();
    assert_eq!(text, "<:> command  <q> back");
  }
}
