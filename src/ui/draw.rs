use anyhow::Result;
use ratatui::backend::Backend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState};
use ratatui::{Frame, Terminal};
// Use Popup from tui-widgets to render modals
use tui_widgets::popup::Popup;

use crate::config::RgbColor;

use super::app::App;
use super::panes::{FormField, PaneFocus};

const FORM_HELP: &str =
    "Tab: next field  ^A: add  ^U: update  ^N: clear  ^D: delete  ^O: import  ^E: export  ^Q: quit";
const SEARCH_HELP: &str = "Type to filter  Enter: results  Tab: results  ^Q: quit";
const RESULTS_HELP: &str = "j/k: move  Enter: edit  x: delete  /: search  Tab: form  q: quit";
const CONFIRM_HELP: &str = "Y/Enter: confirm  N/Esc: cancel";
const PATH_HELP: &str = "Type a file path  Enter: run  Esc: cancel";

pub fn render<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    terminal.draw(|frame| draw_frame(frame, app))?;
    Ok(())
}

fn draw_frame(frame: &mut Frame<'_>, app: &mut App) {
    let size = frame.area();
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(size);

    draw_header(frame, layout[0], app);
    draw_body(frame, layout[1], app);
    draw_footer(frame, layout[2], app);
    draw_confirm_modal(frame, size, app);
    draw_path_modal(frame, size, app);
}

fn draw_header(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let style = header_text_style(app);
    let left = format!("BOOK://{}", app.store().path().display());
    let right = match app.store().len() {
        1 => "1 CONTACT".to_string(),
        n => format!("{} CONTACTS", n),
    };

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(right.len() as u16 + 1),
        ])
        .split(area);

    frame.render_widget(Paragraph::new(Span::styled(left, style)), chunks[0]);
    frame.render_widget(Paragraph::new(Span::styled(right, style)), chunks[1]);
}

fn draw_body(frame: &mut Frame<'_>, area: Rect, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(36), Constraint::Min(0)])
        .split(area);

    draw_form(frame, chunks[0], app);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(chunks[1]);

    draw_search(frame, right[0], app);
    draw_results(frame, right[1], app);
}

fn draw_form(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let active = matches!(app.focused_pane, PaneFocus::Form);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled("CONTACT", header_text_style(app)))
        .border_style(border_style(app, active));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.width == 0 || inner.height == 0 {
        return;
    }

    let mut lines: Vec<Line> = Vec::new();
    let mut cursor: Option<(u16, u16)> = None;
    for field in FormField::ALL {
        let focused = active && app.form.field == field;
        let label_style = if focused {
            header_text_style(app).add_modifier(Modifier::BOLD)
        } else {
            header_text_style(app)
        };
        lines.push(Line::from(Span::styled(field.title(), label_style)));

        let value = app.form.value(field).to_string();
        let value_style = if focused {
            Style::default().add_modifier(Modifier::UNDERLINED)
        } else {
            Style::default()
        };
        if focused {
            let x = inner
                .x
                .saturating_add(app.form.visual_cursor() as u16)
                .min(inner.x + inner.width.saturating_sub(1));
            let y = inner.y.saturating_add(lines.len() as u16);
            cursor = Some((x, y));
        }
        lines.push(Line::from(Span::styled(value, value_style)));
        lines.push(Line::from(""));
    }

    frame.render_widget(Paragraph::new(lines), inner);
    if let Some((x, y)) = cursor {
        if y < inner.y + inner.height {
            frame.set_cursor_position((x, y));
        }
    }
}

fn draw_search(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let active = matches!(app.focused_pane, PaneFocus::Search);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(app, active));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.width == 0 || inner.height == 0 {
        return;
    }

    let label = "SEARCH: ";
    let line = Line::from(vec![
        Span::styled(label, header_text_style(app)),
        Span::raw(app.search_input.value().to_string()),
    ]);
    frame.render_widget(Paragraph::new(line), inner);

    if active {
        let x = inner
            .x
            .saturating_add((label.len() + app.search_input.visual_cursor()) as u16);
        frame.set_cursor_position((x.min(inner.x + inner.width.saturating_sub(1)), inner.y));
    }
}

fn draw_results(frame: &mut Frame<'_>, area: Rect, app: &mut App) {
    let active = matches!(app.focused_pane, PaneFocus::Results);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(app, active));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.width == 0 || inner.height == 0 {
        return;
    }

    let contacts = app.visible_contacts();
    if contacts.is_empty() {
        let message = if app.store().is_empty() {
            "No contacts yet"
        } else {
            "No matches"
        };
        frame.render_widget(
            Paragraph::new(Span::styled(message, header_text_style(app))),
            inner,
        );
        return;
    }

    let header = Row::new(
        ["NAME", "PHONE", "EMAIL", "ADDRESS"]
            .into_iter()
            .map(|title| Cell::from(Span::styled(title, header_text_style(app)))),
    );
    let selected = app.selected;
    let rows: Vec<Row> = contacts
        .iter()
        .map(|contact| {
            // First address line only; the form shows the rest.
            let address = contact.address.lines().next().unwrap_or_default();
            let row = Row::new([
                Cell::from(contact.name.clone()),
                Cell::from(contact.phone.clone()),
                Cell::from(contact.email.clone()),
                Cell::from(address.to_string()),
            ]);
            if selected == Some(contact.id) {
                row.style(Style::default().add_modifier(Modifier::BOLD))
            } else {
                row
            }
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Min(18),
            Constraint::Length(16),
            Constraint::Min(20),
            Constraint::Min(16),
        ],
    )
    .header(header)
    .highlight_style(selection_style(app))
    .highlight_symbol(" ");

    let mut state = TableState::default();
    state.select(app.cursor);
    frame.render_stateful_widget(table, inner, &mut state);
}

fn draw_footer(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let message: String = if app.confirm_modal.is_some() {
        CONFIRM_HELP.to_string()
    } else if app.path_modal.is_some() {
        PATH_HELP.to_string()
    } else if let Some(status) = &app.status {
        status.clone()
    } else {
        match app.focused_pane {
            PaneFocus::Form => FORM_HELP.to_string(),
            PaneFocus::Search => SEARCH_HELP.to_string(),
            PaneFocus::Results => RESULTS_HELP.to_string(),
        }
    };

    let colors = app.ui_colors();
    let style = Style::default()
        .fg(color(colors.status_fg))
        .bg(color(colors.status_bg));

    let background = Block::default().style(Style::default().bg(color(colors.status_bg)));
    frame.render_widget(background, area);

    frame.render_widget(Paragraph::new(message).style(style), area);
}

fn draw_confirm_modal(frame: &mut Frame<'_>, area: Rect, app: &mut App) {
    let Some(modal) = app.confirm_modal.as_ref() else {
        return;
    };

    let body_text = Text::from(vec![
        Line::from(modal.message.clone()),
        Line::from("".to_string()),
        Line::from(CONFIRM_HELP.to_string()),
    ]);

    let title_line = Line::from(Span::styled(modal.title.clone(), header_text_style(app)));
    let popup = Popup::new(body_text)
        .title(title_line)
        .border_style(border_style(app, true));

    frame.render_stateful_widget_ref(popup, area, &mut app.modal_popup);
}

fn draw_path_modal(frame: &mut Frame<'_>, area: Rect, app: &mut App) {
    let Some(modal) = app.path_modal.as_ref() else {
        return;
    };

    let label = "PATH: ";
    let line = Line::from(vec![
        Span::styled(label, header_text_style(app)),
        Span::raw(modal.input.value().to_string()),
    ]);
    let body_text = Text::from(vec![
        line,
        Line::from("".to_string()),
        Line::from(PATH_HELP.to_string()),
    ]);

    let title = modal.purpose.title();
    let title_line = Line::from(Span::styled(title, header_text_style(app)));
    let popup = Popup::new(body_text)
        .title(title_line)
        .border_style(border_style(app, true));

    frame.render_stateful_widget_ref(popup, area, &mut app.modal_popup);

    if let Some(area) = app.modal_popup.area() {
        let inner = Block::default().borders(Borders::ALL).inner(*area);
        if let Some(modal) = app.path_modal.as_ref() {
            let x = inner
                .x
                .saturating_add(label.len() as u16 + modal.input.visual_cursor() as u16);
            frame.set_cursor_position((x, inner.y));
        }
    }
}

fn selection_style(app: &App) -> Style {
    let colors = app.ui_colors();
    Style::default()
        .fg(color(colors.selection_fg))
        .bg(color(colors.selection_bg))
}

fn border_style(app: &App, active: bool) -> Style {
    let colors = app.ui_colors();
    let style = Style::default().fg(color(colors.border));
    if active {
        style.add_modifier(Modifier::BOLD)
    } else {
        style
    }
}

fn header_text_style(app: &App) -> Style {
    let colors = app.ui_colors();
    Style::default().fg(color(colors.border))
}

fn color(rgb: RgbColor) -> Color {
    Color::Rgb(rgb.r, rgb.g, rgb.b)
}
