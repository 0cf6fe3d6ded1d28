use ratatui::prelude::*;
use ratatui::symbols::Marker;
use ratatui::widgets::canvas::{Canvas, Points};
use ratatui::widgets::{Bar, BarChart, BarGroup, Block, Cell, Clear, Paragraph, Row, Table, Tabs};

use crate::output::format_score;
use crate::table::{centroid, heat_points, top_n, HeatGrid, Level, LevelScore};
use crate::tui::app::{App, FlashLevel, InputMode, View};
use crate::tui::theme::{heat_color, ThemeColors};

const SIDEBAR_WIDTH: u16 = 36;

pub fn draw(frame: &mut Frame, app: &mut App) {
    let area = frame.area();

    // Handle very small terminal sizes gracefully
    if area.height < 10 || area.width < 60 {
        let msg = Paragraph::new("Terminal too small").alignment(Alignment::Center);
        frame.render_widget(msg, area);
        return;
    }

    // Layout: Title(1) + Tabs(1) + Body(fill) + Status(1)
    let chunks = Layout::vertical([
        Constraint::Length(1), // Title bar
        Constraint::Length(1), // Tab bar
        Constraint::Fill(1),   // Sidebar + main view
        Constraint::Length(1), // Status bar
    ])
    .split(area);

    let body = Layout::horizontal([Constraint::Length(SIDEBAR_WIDTH), Constraint::Fill(1)])
        .split(chunks[2]);

    render_title(frame, chunks[0], app);
    render_tabs(frame, chunks[1], app);
    render_sidebar(frame, body[0], app);
    match app.current_view {
        View::Table => render_table(frame, body[1], app),
        View::Rankings => render_rankings(frame, body[1], app),
        View::Map => render_map(frame, body[1], app),
    }
    render_status_bar(frame, chunks[3], app);

    // Render overlays based on input mode
    match app.input_mode {
        InputMode::Help => render_help_popup(frame, &app.colors),
        InputMode::ScoreBreakdown => render_breakdown_popup(frame, app),
        InputMode::ProvincePicker => render_province_picker(frame, app),
        InputMode::Normal | InputMode::WeightEditor => {}
    }
}

fn render_title(frame: &mut Frame, area: Rect, app: &App) {
    let colors = &app.colors;
    let name = "Opportunity Score";
    let mut spans = vec![Span::styled(name, Style::default().fg(colors.title_color).bold())];

    let info = format!(
        "{} entities, {} features",
        app.scores().len(),
        app.session.schema().len()
    );
    let padding_len = (area.width as usize).saturating_sub(name.len() + info.len());
    spans.push(Span::raw(" ".repeat(padding_len)));
    spans.push(Span::styled(info, Style::default().fg(colors.muted)));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_tabs(frame: &mut Frame, area: Rect, app: &App) {
    let titles: Vec<&str> = View::ALL.iter().map(|v| v.title()).collect();
    let selected = View::ALL
        .iter()
        .position(|v| *v == app.current_view)
        .unwrap_or(0);

    let tabs = Tabs::new(titles)
        .select(selected)
        .style(app.colors.tab_inactive_style)
        .highlight_style(app.colors.tab_active_style.reversed())
        .divider(" | ");

    frame.render_widget(tabs, area);
}

fn render_sidebar(frame: &mut Frame, area: Rect, app: &App) {
    let weight_rows = app.pending.len() as u16;
    let chunks = Layout::vertical([
        Constraint::Length(weight_rows + 4), // Border(2) + weights + blank + sum
        Constraint::Fill(1),                 // Filter
    ])
    .split(area);

    render_weights(frame, chunks[0], app);
    render_filter(frame, chunks[1], app);
}

fn render_weights(frame: &mut Frame, area: Rect, app: &App) {
    let colors = &app.colors;
    let editing = app.input_mode == InputMode::WeightEditor;
    let title = if editing { " Weights (editing) " } else { " Weights " };
    let border_color = if editing { colors.popup_border } else { colors.divider_color };
    let block = Block::bordered()
        .title(title)
        .border_style(Style::default().fg(border_color));
    let inner = block.inner(area);

    let name_width = (inner.width as usize).saturating_sub(18).max(6);
    let mut lines: Vec<Line> = app
        .pending
        .iter()
        .enumerate()
        .map(|(idx, (feature, weight))| {
            let applied = app.session.applied_weights().get(feature);
            let changed = applied.map_or(true, |w| (w - weight).abs() > f64::EPSILON);
            let value_color = if changed { colors.weight_pending } else { colors.muted };

            let mut spans = vec![Span::raw(format!(
                "{:<width$} ",
                truncate_title(feature, name_width),
                width = name_width
            ))];
            spans.extend(weight_gauge(weight, 10, colors).spans);
            spans.push(Span::styled(
                format!(" {:.2}", weight),
                Style::default().fg(value_color),
            ));

            let line = Line::from(spans);
            if idx == app.selected_weight {
                line.style(colors.row_selected)
            } else {
                line
            }
        })
        .collect();

    let sum = app.pending.sum();
    let (sum_color, sum_note) = if app.pending.is_valid() {
        (colors.weight_sum_ok, "")
    } else {
        (colors.weight_sum_bad, "  must total 1")
    };
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::raw("Total "),
        Span::styled(format!("{:.2}", sum), Style::default().fg(sum_color).bold()),
        Span::styled(sum_note, Style::default().fg(sum_color)),
    ]));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn weight_gauge(weight: f64, width: usize, colors: &ThemeColors) -> Line<'static> {
    let filled = (weight.clamp(0.0, 1.0) * width as f64).round() as usize;
    let empty = width.saturating_sub(filled);

    let mut spans = Vec::new();
    if filled > 0 {
        spans.push(Span::styled("█".repeat(filled), Style::default().fg(colors.gauge_filled)));
    }
    if empty > 0 {
        spans.push(Span::styled("░".repeat(empty), Style::default().fg(colors.gauge_empty)));
    }
    Line::from(spans)
}

fn render_filter(frame: &mut Frame, area: Rect, app: &App) {
    let colors = &app.colors;
    let block = Block::bordered()
        .title(" Filter ")
        .border_style(Style::default().fg(colors.divider_color));

    let region = app.region_filter.region.as_deref().unwrap_or("All regions");
    let mut lines = vec![
        Line::from(vec![
            Span::styled("Region    ", Style::default().fg(colors.muted)),
            Span::raw(region.to_string()),
        ]),
        Line::from(Span::styled("Provinces", Style::default().fg(colors.muted))),
    ];

    if app.region_filter.provinces.is_empty() {
        lines.push(Line::from("  all"));
    } else {
        lines.extend(
            app.region_filter
                .provinces
                .iter()
                .map(|p| Line::from(format!("  {}", p))),
        );
    }

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_table(frame: &mut Frame, area: Rect, app: &mut App) {
    let colors = app.colors.clone();
    let visible = app.visible_rows();

    if visible.is_empty() {
        let empty_msg = Paragraph::new("No entities match the current filters")
            .alignment(Alignment::Center)
            .block(Block::default());
        frame.render_widget(empty_msg, area);
        return;
    }

    // Calculate max score for bar scaling
    let max_score = app.scores().max_score();

    let rows: Vec<Row> = visible
        .iter()
        .enumerate()
        .map(|(idx, row)| {
            let score = row.opportunity_score();
            let score_color = colors.score_color(score, max_score);
            let mut score_spans = vec![Span::styled(
                format!("{} ", format_score(score)),
                Style::default().fg(score_color),
            )];
            score_spans.extend(score_bar(score, max_score, 8, &colors).spans);

            // Alternating row background (odd rows get subtle background)
            let row_style = if idx % 2 == 1 {
                Style::default().bg(colors.row_alt_bg)
            } else {
                Style::default()
            };

            Row::new(vec![
                Cell::from(format!("{}.", idx + 1)).style(Style::default().fg(colors.index_color)),
                Cell::from(Line::from(score_spans)),
                Cell::from(truncate_title(&row.entity.city_municipality, 40)),
                Cell::from(truncate_title(&row.entity.province, 24)),
                Cell::from(format!("{:.4}, {:.4}", row.entity.lat, row.entity.long)),
            ])
            .style(row_style)
        })
        .collect();

    // Column widths
    let widths = [
        Constraint::Length(5),  // Index: "999."
        Constraint::Length(16), // Score + bar: "0.6123 ████░░░░"
        Constraint::Fill(1),    // City/municipality
        Constraint::Length(24), // Province
        Constraint::Length(20), // Lat, long
    ];

    let table = Table::new(rows, widths)
        .header(
            Row::new(vec!["#", "Score", "City/Municipality", "Province", "Location"])
                .style(colors.header_style)
                .bottom_margin(1),
        )
        .row_highlight_style(colors.row_selected);

    frame.render_stateful_widget(table, area, &mut app.table_state);
}

fn score_bar(score: f64, max_score: f64, width: usize, colors: &ThemeColors) -> Line<'static> {
    let ratio = if max_score > 0.0 {
        (score / max_score).min(1.0)
    } else {
        0.0
    };
    let filled = (ratio * width as f64).round() as usize;
    let empty = width.saturating_sub(filled);

    // Get color based on score
    let bar_color = colors.score_color(score, max_score);

    let mut spans = Vec::new();
    if filled > 0 {
        spans.push(Span::styled("█".repeat(filled), Style::default().fg(bar_color)));
    }
    if empty > 0 {
        spans.push(Span::styled("░".repeat(empty), Style::default().fg(colors.gauge_empty)));
    }

    Line::from(spans)
}

fn render_rankings(frame: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::vertical([
        Constraint::Ratio(1, 3),
        Constraint::Ratio(1, 3),
        Constraint::Ratio(1, 3),
    ])
    .split(area);

    for (level, chunk) in Level::ALL.iter().zip(chunks.iter()) {
        let ranking = top_n(app.scores(), *level, app.top_n);
        render_ranking_chart(frame, *chunk, *level, &ranking, &app.colors);
    }
}

fn render_ranking_chart(
    frame: &mut Frame,
    area: Rect,
    level: Level,
    ranking: &[LevelScore],
    colors: &ThemeColors,
) {
    let block = Block::bordered()
        .title(format!(" Top {} by {} ", ranking.len(), level))
        .title_style(colors.title_style)
        .border_style(Style::default().fg(colors.divider_color));

    if ranking.is_empty() {
        frame.render_widget(Paragraph::new("No data").block(block), area);
        return;
    }

    let label_width = (area.width as usize / 3).clamp(8, 30);
    let bars: Vec<Bar> = ranking
        .iter()
        .map(|group| {
            Bar::default()
                .value((group.mean.max(0.0) * 10_000.0).round() as u64)
                .label(Line::from(truncate_title(&group.name, label_width)))
                .text_value(format_score(group.mean))
                .style(Style::default().fg(colors.bar_color))
        })
        .collect();

    let chart = BarChart::default()
        .block(block)
        .direction(Direction::Horizontal)
        .bar_width(1)
        .bar_gap(0)
        .data(BarGroup::default().bars(&bars));

    frame.render_widget(chart, area);
}

fn render_map(frame: &mut Frame, area: Rect, app: &App) {
    let colors = &app.colors;
    let title = match centroid(app.scores()) {
        Some((lat, long)) => format!(" Opportunity heat map, centered on {:.3}, {:.3} ", lat, long),
        None => " Opportunity heat map ".to_string(),
    };
    let block = Block::bordered()
        .title(title)
        .title_style(colors.title_style)
        .border_style(Style::default().fg(colors.divider_color));
    let inner = block.inner(area);

    let points = heat_points(app.scores());
    let grid = match HeatGrid::from_points(&points, inner.width as usize, inner.height as usize) {
        Some(grid) => grid,
        None => {
            frame.render_widget(Paragraph::new("No data").block(block), area);
            return;
        }
    };

    // One canvas cell per grid cell, colored by the best score binned into it
    let bounds = grid.bounds.padded(0.01);
    let lat_step = (grid.bounds.max_lat - grid.bounds.min_lat) / grid.rows as f64;
    let long_step = (grid.bounds.max_long - grid.bounds.min_long) / grid.cols as f64;
    let mut cells: Vec<((f64, f64), Color)> = Vec::with_capacity(grid.occupied());
    for row in 0..grid.rows {
        for col in 0..grid.cols {
            if let Some(score) = grid.get(col, row) {
                let long = grid.bounds.min_long + (col as f64 + 0.5) * long_step;
                let lat = grid.bounds.max_lat - (row as f64 + 0.5) * lat_step;
                cells.push(((long, lat), heat_color(&app.gradient, score)));
            }
        }
    }

    let canvas = Canvas::default()
        .block(block)
        .marker(Marker::Block)
        .background_color(colors.map_background)
        .x_bounds([bounds.min_long, bounds.max_long])
        .y_bounds([bounds.min_lat, bounds.max_lat])
        .paint(move |ctx| {
            for (coord, color) in &cells {
                ctx.draw(&Points {
                    coords: std::slice::from_ref(coord),
                    color: *color,
                });
            }
        });

    frame.render_widget(canvas, area);
}

fn render_status_bar(frame: &mut Frame, area: Rect, app: &App) {
    let colors = &app.colors;
    let text = if let Some((ref msg, _, level)) = app.flash_message {
        let msg_color = match level {
            FlashLevel::Info => colors.flash_success,
            FlashLevel::Warning => colors.flash_error,
        };
        Line::from(Span::styled(msg.clone(), Style::default().fg(msg_color)))
    } else {
        let count = format!("{} rows", app.visible_rows().len());
        let pending = if app.has_pending_changes() {
            "unapplied changes"
        } else {
            ""
        };

        let hints: Vec<(&str, &str)> = match app.input_mode {
            InputMode::WeightEditor => vec![
                ("j/k", ":feature "),
                ("h/l", ":±0.01 "),
                ("H/L", ":±0.10 "),
                ("a", ":apply "),
                ("n", ":normalize "),
                ("Esc", ":done"),
            ],
            _ => vec![
                ("w", ":weights "),
                ("a", ":apply "),
                ("g", ":region "),
                ("p", ":provinces "),
                ("Tab", ":view "),
                ("?", ":help "),
                ("q", ":quit"),
            ],
        };

        // Build hints with colored shortcut keys
        let mut spans = vec![
            Span::styled(count, Style::default().fg(colors.muted)),
            Span::raw(" "),
            Span::styled(pending, Style::default().fg(colors.weight_pending)),
            Span::raw("  "),
        ];
        for (i, (key, label)) in hints.iter().enumerate() {
            if i > 0 {
                spans.push(Span::raw(" "));
            }
            spans.push(Span::styled(*key, Style::default().fg(colors.status_key_color)));
            spans.push(Span::raw(*label));
        }
        Line::from(spans)
    };

    frame.render_widget(
        Paragraph::new(text).style(Style::default().bg(colors.status_bar_bg)),
        area,
    );
}

fn truncate_title(title: &str, max_width: usize) -> String {
    let chars: Vec<char> = title.chars().collect();
    if chars.len() <= max_width {
        title.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

/// Create a centered rectangle with fixed width and height
fn centered_rect_fixed(width: u16, height: u16, area: Rect) -> Rect {
    // Clamp dimensions to area bounds
    let width = width.min(area.width);
    let height = height.min(area.height);

    // Calculate centered position
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;

    Rect {
        x,
        y,
        width,
        height,
    }
}

/// Render the help overlay popup
fn render_help_popup(frame: &mut Frame, colors: &ThemeColors) {
    let popup_area = centered_rect_fixed(56, 24, frame.area());

    // Clear the background
    frame.render_widget(Clear, popup_area);

    let block = Block::bordered()
        .title(" Keyboard Shortcuts ")
        .title_style(colors.popup_title)
        .border_style(Style::default().fg(colors.popup_border))
        .style(Style::default().bg(colors.popup_bg));
    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let entries = [
        ("j / Down", "Next row (next feature while editing)"),
        ("k / Up", "Previous row (previous feature while editing)"),
        ("w", "Edit weights"),
        ("h / l  ← / →", "Nudge selected weight by 0.01"),
        ("H / L", "Nudge selected weight by 0.10"),
        ("a", "Apply weights"),
        ("n", "Normalize weights to total 1"),
        ("d", "Reset weights to dataset defaults"),
        ("z", "Undo last apply"),
        ("g", "Next region"),
        ("p", "Pick provinces"),
        ("Tab", "Table / Rankings / Map"),
        ("b", "Score breakdown"),
        ("?", "Show/hide this help"),
        ("q / Ctrl-c", "Quit"),
    ];

    let key_style = Style::default().fg(colors.status_key_color).bold();
    let mut help_lines: Vec<Line> = entries
        .iter()
        .map(|(key, action)| {
            Line::from(vec![
                Span::styled(format!("{:<14}", key), key_style),
                Span::raw(*action),
            ])
        })
        .collect();
    help_lines.push(Line::from(""));
    help_lines.push(Line::from(Span::styled(
        "Press any key to close",
        Style::default().fg(colors.muted),
    )));

    frame.render_widget(Paragraph::new(help_lines), inner);
}

/// Render the selected entity's score breakdown popup
fn render_breakdown_popup(frame: &mut Frame, app: &App) {
    let colors = &app.colors;
    let row = match app.selected_entity() {
        Some(row) => row,
        None => return,
    };
    let contributions = &row.result.breakdown.contributions;

    let height = (contributions.len() as u16 + 8).max(10);
    let popup_area = centered_rect_fixed(64, height, frame.area());
    frame.render_widget(Clear, popup_area);

    let block = Block::bordered()
        .title(format!(" {} ", row.entity.label()))
        .title_style(colors.popup_title)
        .border_style(Style::default().fg(colors.popup_border))
        .style(Style::default().bg(colors.popup_bg));
    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let header_style = colors.header_style;
    let mut lines = vec![Line::from(Span::styled(
        format!("{:<22}{:>10}{:>10}{:>14}", "Feature", "Scaled", "Weight", "Contribution"),
        header_style,
    ))];

    if contributions.is_empty() {
        lines.push(Line::from(Span::styled(
            "Score supplied with the dataset; apply weights to see contributions",
            Style::default().fg(colors.muted),
        )));
    } else {
        lines.extend(contributions.iter().map(|c| {
            Line::from(format!(
                "{:<22}{:>10.4}{:>10.2}{:>14.4}",
                truncate_title(&c.feature, 21),
                c.value,
                c.weight,
                c.contribution
            ))
        }));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("Opportunity score  ", header_style),
        Span::styled(
            format_score(row.opportunity_score()),
            Style::default()
                .fg(colors.score_color(row.opportunity_score(), app.scores().max_score()))
                .bold(),
        ),
    ]));
    lines.push(Line::from(Span::styled(
        "Esc/b: close  j/k: next/previous row",
        Style::default().fg(colors.muted),
    )));

    frame.render_widget(Paragraph::new(lines), inner);
}

/// Render the province multi-select popup
fn render_province_picker(frame: &mut Frame, app: &App) {
    let colors = &app.colors;
    let provinces = app.picker_provinces();
    let height = (provinces.len() as u16 + 4).min(frame.area().height);
    let popup_area = centered_rect_fixed(44, height, frame.area());
    frame.render_widget(Clear, popup_area);

    let region = app.region_filter.region.as_deref().unwrap_or("");
    let block = Block::bordered()
        .title(format!(" Provinces of {} ", region))
        .title_style(colors.popup_title)
        .border_style(Style::default().fg(colors.popup_border))
        .style(Style::default().bg(colors.popup_bg));
    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let chunks = Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]).split(inner);

    // Keep the cursor in view
    let visible = chunks[0].height as usize;
    let offset = app.picker_cursor.saturating_sub(visible.saturating_sub(1));

    let lines: Vec<Line> = provinces
        .iter()
        .enumerate()
        .skip(offset)
        .take(visible)
        .map(|(idx, province)| {
            let checked = app.picker_selection.iter().any(|p| p == province);
            let mark = if checked { "[x]" } else { "[ ]" };
            let line = Line::from(format!("{} {}", mark, province));
            if idx == app.picker_cursor {
                line.style(colors.row_selected)
            } else {
                line
            }
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), chunks[0]);

    let help = Paragraph::new("Space: toggle | Enter: confirm | Esc: cancel")
        .style(Style::default().fg(colors.muted));
    frame.render_widget(help, chunks[1]);
}
