use crate::app::{App, Mode};
use crate::dashboard::{ListId, StatusLevel, StreamList};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, BorderType, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;
use unicode_width::UnicodeWidthStr;

const ACCENT: Color = Color::Cyan;
const MUTED: Color = Color::DarkGray;
const MATCH: Color = Color::Red;
const MAX_SUGGESTIONS: usize = 8;

pub fn draw(f: &mut Frame, app: &mut App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(f.size());
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(rows[0]);

    draw_lists(f, app, columns[0]);
    draw_info(f, app, columns[1]);
    draw_status(f, app, rows[1]);
    draw_cmdline(f, app, rows[2], rows[0]);
}

fn draw_lists(f: &mut Frame, app: &mut App, area: Rect) {
    let ids: Vec<ListId> = if app.dashboard.strims_visible {
        ListId::ALL.to_vec()
    } else {
        vec![ListId::Twitch]
    };
    let total: u32 = ids
        .iter()
        .map(|&id| u32::from(app.dashboard.list(id).weight))
        .sum();
    let constraints: Vec<Constraint> = ids
        .iter()
        .map(|&id| Constraint::Ratio(u32::from(app.dashboard.list(id).weight), total.max(1)))
        .collect();
    let areas = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    let focused = app.dashboard.focused;
    let search = app.dashboard.last_search.clone();
    for (&id, &rect) in ids.iter().zip(areas.iter()) {
        let list = app.dashboard.list_mut(id);
        list.height = usize::from(rect.height.saturating_sub(2));
        let selected = list.selected();
        list.select(selected);
        draw_list(f, list, rect, id == focused, &search);
    }
}

fn draw_list(f: &mut Frame, list: &StreamList, area: Rect, focused: bool, search: &str) {
    let offset = list.offset();
    let items: Vec<ListItem> = list
        .visible()
        .skip(offset)
        .take(list.height)
        .map(|stream| {
            let mut spans = highlight(&stream.name, search, Style::default().add_modifier(Modifier::BOLD));
            spans.push(Span::styled(
                format!(" {} ", stream.viewers),
                Style::default().fg(MUTED),
            ));
            spans.extend(highlight(&stream.title, search, Style::default()));
            ListItem::new(Line::from(spans))
        })
        .collect();

    let mut title = format!(" {} ({}/{}) ", list.id.name(), list.len(), list.total());
    let filter = list.filter();
    if filter.is_active() {
        let marker = if filter.inverted { "v" } else { "g" };
        title.push_str(&format!("[{marker}/{}/] ", filter.pattern));
    }
    let border = if focused { ACCENT } else { MUTED };
    let mut state = ListState::default();
    if !list.is_empty() {
        state.select(Some(list.selected() - offset));
    }
    let widget = List::new(items)
        .block(
            Block::bordered()
                .title(title)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(border)),
        )
        .highlight_style(Style::default().bg(if focused { ACCENT } else { MUTED }).fg(Color::Black));
    f.render_stateful_widget(widget, area, &mut state);
}

/// Splits `text` so the first case-insensitive occurrence of `needle` stands out.
fn highlight(text: &str, needle: &str, base: Style) -> Vec<Span<'static>> {
    let lower = text.to_lowercase();
    let needle = needle.to_lowercase();
    // byte offsets only carry over when lowercasing kept the lengths
    let found = (!needle.is_empty() && lower.len() == text.len())
        .then(|| lower.find(&needle))
        .flatten()
        .filter(|&start| {
            text.is_char_boundary(start) && text.is_char_boundary(start + needle.len())
        });
    match found {
        Some(start) => {
            let end = start + needle.len();
            vec![
                Span::styled(text[..start].to_string(), base),
                Span::styled(text[start..end].to_string(), base.fg(MATCH)),
                Span::styled(text[end..].to_string(), base),
            ]
        }
        None => vec![Span::styled(text.to_string(), base)],
    }
}

fn draw_info(f: &mut Frame, app: &App, area: Rect) {
    let info = &app.dashboard.info;
    let paragraph = Paragraph::new(Text::from(info.text.clone()))
        .block(
            Block::bordered()
                .title(format!(" {} ", info.title))
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(MUTED)),
        )
        .wrap(Wrap { trim: false })
        .scroll((info.scroll, 0));
    f.render_widget(paragraph, area);
}

fn draw_status(f: &mut Frame, app: &App, area: Rect) {
    let mut parts = vec![Span::styled(
        "streamshower",
        Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
    )];
    if let Some(elapsed) = app
        .dashboard
        .last_fetched
        .and_then(|at| at.elapsed().ok())
    {
        parts.push(Span::styled(
            format!(" | fetched {}s ago", elapsed.as_secs()),
            Style::default().fg(MUTED),
        ));
    }
    if app.dashboard.winopen {
        parts.push(Span::styled(" | winopen", Style::default().fg(MUTED)));
    }
    if let Some(status) = &app.dashboard.status {
        let color = match status.level {
            StatusLevel::Info => Color::Reset,
            StatusLevel::Success => Color::Green,
            StatusLevel::Warning => Color::Yellow,
            StatusLevel::Error => Color::Red,
        };
        parts.push(Span::styled(" | ", Style::default().fg(MUTED)));
        parts.push(Span::styled(status.text.clone(), Style::default().fg(color)));
    }
    f.render_widget(Paragraph::new(Line::from(parts)), area);
}

fn draw_cmdline(f: &mut Frame, app: &App, area: Rect, above: Rect) {
    if app.mode != Mode::CommandLine {
        return;
    }
    let text = app.cmdline.text();
    f.render_widget(Paragraph::new(text.to_string()), area);

    let before: String = text.chars().take(app.cmdline.cursor()).collect();
    let x = area.x + (before.width() as u16).min(area.width.saturating_sub(1));
    f.set_cursor(x, area.y);

    let suggestions = app.cmdline.suggestions();
    if suggestions.is_empty() {
        return;
    }
    let shown = suggestions.len().min(MAX_SUGGESTIONS) as u16;
    let height = (shown + 2).min(above.height);
    let width = suggestions
        .iter()
        .map(|s| s.width() as u16 + 4)
        .max()
        .unwrap_or(10)
        .max(10)
        .min(above.width);
    let popup = Rect {
        x: above.x,
        y: above.y + above.height - height,
        width,
        height,
    };
    let items: Vec<ListItem> = suggestions
        .iter()
        .map(|s| ListItem::new(s.clone()))
        .collect();
    let mut state = ListState::default();
    state.select(app.cmdline.selected());
    let widget = List::new(items)
        .block(
            Block::bordered()
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(ACCENT)),
        )
        .highlight_style(Style::default().bg(ACCENT).fg(Color::Black));
    f.render_widget(Clear, popup);
    f.render_stateful_widget(widget, popup, &mut state);
}
