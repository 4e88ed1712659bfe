mod theme;

use crate::app::{AppModel, InputMode, View};
use crate::domain::{ResultKind, ResultRecord};
use ratatui::prelude::*;
use ratatui::widgets::*;
use std::collections::VecDeque;
use time::macros::format_description;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const PROMPT: &str = "> ";
const PLACEHOLDER: &str = "Type a command... (try /help)";

pub fn render(frame: &mut Frame, model: &AppModel) {
    let area = frame.area();
    if area.width == 0 || area.height == 0 {
        return;
    }

    frame.render_widget(Block::default().style(Style::default().bg(theme::BG)), area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(5),
            Constraint::Min(0),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .split(area);

    render_header(frame, chunks[0], model);
    render_view_panel(frame, chunks[1], &model.view);
    render_scrollback(frame, chunks[2], model);
    render_input(frame, chunks[3], model);
    render_footer(frame, chunks[4]);

    if let InputMode::ShowingAutocomplete {
        candidates,
        selected,
    } = model.input.mode()
    {
        render_autocomplete(frame, chunks[3], candidates, *selected);
    }
}

fn render_header(frame: &mut Frame, area: Rect, model: &AppModel) {
    let base = Style::default().fg(theme::FG).bg(theme::BAR_BG);
    let title_style = Style::default()
        .fg(theme::ACCENT)
        .bg(theme::BAR_BG)
        .add_modifier(Modifier::BOLD);
    let muted = Style::default().fg(theme::MUTED).bg(theme::BAR_BG);

    let left = vec![
        Span::styled(" NEO-BBS ".to_string(), title_style),
        Span::styled(format!(" {} ", model.view.title()), base),
        Span::styled(format!("[{}]", model.scrollback.active_key()), muted),
    ];

    let right = if model.in_flight > 0 {
        format!("{} pending  {} ", model.in_flight, model.api_url)
    } else {
        format!("{} ", model.api_url)
    };

    let used: usize = left.iter().map(|span| span.content.width()).sum();
    let gap = (area.width as usize).saturating_sub(used + right.width());

    let mut spans = left;
    spans.push(Span::styled(" ".repeat(gap), base));
    spans.push(Span::styled(right, muted));
    frame.render_widget(Paragraph::new(Line::from(spans)).style(base), area);
}

fn render_view_panel(frame: &mut Frame, area: Rect, view: &View) {
    let lines = match view {
        View::Home => vec![
            Line::from(vec![
                Span::styled("// SYSTEM_", Style::default().fg(theme::FG)),
                Span::styled(
                    "READY",
                    Style::default()
                        .fg(theme::ACCENT)
                        .add_modifier(Modifier::BOLD),
                ),
            ]),
            Line::from("CONNECTION: SECURE   STATUS: ONLINE"),
            Line::from(Span::styled(
                "Type /help for commands, /news for the latest bulletin.",
                Style::default().fg(theme::MUTED),
            )),
        ],
        View::Board { board_id } => vec![
            Line::from(format!("Browsing /{board_id}/")),
            Line::from(Span::styled(
                "/read <thread_id> opens a thread, /post starts one, /back returns home.",
                Style::default().fg(theme::MUTED),
            )),
        ],
        View::Thread { thread_id, .. } => vec![
            Line::from(format!("Reading thread #{thread_id}")),
            Line::from(Span::styled(
                "/back returns to the board.",
                Style::default().fg(theme::MUTED),
            )),
        ],
        View::NewThread { .. } => vec![
            Line::from("Composing a new thread"),
            Line::from(Span::styled(
                "/back cancels.",
                Style::default().fg(theme::MUTED),
            )),
        ],
    };

    let panel = Paragraph::new(lines)
        .style(Style::default().fg(theme::FG))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme::BORDER))
                .padding(Padding::horizontal(1))
                .title(view.title()),
        );
    frame.render_widget(panel, area);
}

fn render_scrollback(frame: &mut Frame, area: Rect, model: &AppModel) {
    let block = Block::default()
        .borders(Borders::LEFT | Borders::RIGHT)
        .border_style(Style::default().fg(theme::BORDER))
        .padding(Padding::horizontal(1));
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.height == 0 {
        return;
    }

    let height = usize::from(inner.height);
    let wanted = height + usize::from(model.scroll_from_bottom);
    let window = tail_rows(model.scrollback.visible(), usize::from(inner.width), wanted)
        .into_iter()
        .take(height)
        .collect::<Vec<_>>();

    frame.render_widget(Paragraph::new(window), inner);
}

/// Number of rows the log occupies at `width`; scrolling is bounded by this.
pub fn scrollback_rows(records: &[ResultRecord], width: u16) -> usize {
    records
        .iter()
        .map(|record| record_rows(record, usize::from(width)).len())
        .sum()
}

/// The last `wanted` rows of the log, oldest first. Only the records that reach into the
/// window get laid out, so the cost follows the viewport and not the log length.
fn tail_rows(records: &[ResultRecord], width: usize, wanted: usize) -> VecDeque<Line<'static>> {
    let mut tail = VecDeque::with_capacity(wanted.min(1024));
    for record in records.iter().rev() {
        if tail.len() >= wanted {
            break;
        }
        for row in record_rows(record, width).into_iter().rev() {
            tail.push_front(row);
        }
    }
    while tail.len() > wanted {
        tail.pop_front();
    }
    tail
}

/// Echo, wrapped output, then a blank spacer.
fn record_rows(record: &ResultRecord, width: usize) -> Vec<Line<'static>> {
    let echo_style = Style::default()
        .fg(theme::DIM)
        .add_modifier(Modifier::ITALIC);
    let stamp = record
        .created_at
        .format(format_description!("[hour]:[minute]:[second]"))
        .unwrap_or_default();

    let mut rows = vec![Line::from(vec![
        Span::styled(format!("$ {}", record.command), echo_style),
        Span::styled(format!("  {stamp}"), Style::default().fg(theme::BORDER)),
    ])];
    let style = kind_style(record.kind);
    for line in record.output.lines() {
        for piece in wrap_to_width(line, width) {
            rows.push(Line::from(Span::styled(piece, style)));
        }
    }
    rows.push(Line::from(""));
    rows
}

/// Hard-wraps on display width. A zero width leaves the text alone.
fn wrap_to_width(text: &str, width: usize) -> Vec<String> {
    if width == 0 || text.width() <= width {
        return vec![text.to_string()];
    }

    let mut rows = Vec::new();
    let mut current = String::new();
    let mut used = 0usize;
    for ch in text.chars() {
        let ch_width = ch.width().unwrap_or(0);
        if used + ch_width > width && !current.is_empty() {
            rows.push(std::mem::take(&mut current));
            used = 0;
        }
        current.push(ch);
        used += ch_width;
    }
    rows.push(current);
    rows
}

fn kind_style(kind: ResultKind) -> Style {
    match kind {
        ResultKind::Success => Style::default().fg(theme::SUCCESS),
        ResultKind::Error => Style::default().fg(theme::ERROR),
        ResultKind::Info => Style::default().fg(theme::INFO),
    }
}

fn render_input(frame: &mut Frame, area: Rect, model: &AppModel) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme::ACCENT));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let draft = model.input.draft();
    let prompt = Span::styled(
        PROMPT,
        Style::default()
            .fg(theme::ACCENT)
            .add_modifier(Modifier::BOLD),
    );
    let body = if draft.is_empty() {
        Span::styled(PLACEHOLDER, Style::default().fg(theme::DIM))
    } else {
        Span::styled(draft.to_string(), Style::default().fg(theme::FG))
    };
    frame.render_widget(Paragraph::new(Line::from(vec![prompt, body])), inner);

    if inner.width == 0 || inner.height == 0 {
        return;
    }
    let before_cursor: String = draft.chars().take(model.input.cursor()).collect();
    let column = PROMPT.width() + before_cursor.width();
    let max_x = inner.x + inner.width.saturating_sub(1);
    let x = (inner.x + u16::try_from(column).unwrap_or(u16::MAX)).min(max_x);
    frame.set_cursor_position((x, inner.y));
}

fn render_autocomplete(frame: &mut Frame, input_area: Rect, candidates: &[&str], selected: usize) {
    if candidates.is_empty() {
        return;
    }

    let widest = candidates
        .iter()
        .map(|candidate| candidate.width())
        .max()
        .unwrap_or(0);
    let width = u16::try_from(widest + 6).unwrap_or(u16::MAX).max(20);
    let height = u16::try_from(candidates.len() + 2).unwrap_or(u16::MAX);
    let height = height.min(input_area.y);
    if height < 3 {
        return;
    }

    let popup = Rect {
        x: input_area.x.saturating_add(2),
        y: input_area.y - height,
        width: width.min(input_area.width.saturating_sub(2)),
        height,
    };
    frame.render_widget(Clear, popup);

    let items: Vec<ListItem> = candidates
        .iter()
        .map(|candidate| ListItem::new(Line::from(candidate.to_string())))
        .collect();
    let list = List::new(items)
        .style(Style::default().fg(theme::FG).bg(theme::BG))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme::ACCENT)),
        )
        .highlight_style(
            Style::default()
                .bg(theme::ACCENT_BG)
                .add_modifier(Modifier::BOLD),
        );

    let mut state = ListState::default();
    state.select(Some(selected.min(candidates.len() - 1)));
    frame.render_stateful_widget(list, popup, &mut state);
}

fn render_footer(frame: &mut Frame, area: Rect) {
    let text = "Enter=run  Tab=complete  Up/Down=history  Esc=close  PgUp/PgDn=scroll  Ctrl+C=quit";
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            text,
            Style::default().fg(theme::MUTED),
        ))),
        area,
    );
}
