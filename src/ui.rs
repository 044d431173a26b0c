//! Terminal UI rendering.
//!
//! All drawing logic lives here, separated from application state ([`App`])
//! and input handling ([`crate::input`]). The feed renders as a card grid
//! whose column count is re-derived from the settings and terminal width on
//! every frame, or as a single-column list in list mode. Overlays (post
//! detail, context menu) draw on top of the grid.

use chrono::{DateTime, Utc};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, Panel};
use crate::feed::{FeedItem, Post, Vote};
use crate::layout::{position, row_count};

/// Height of one card row in the grid, borders included.
const CARD_HEIGHT: u16 = 6;

/// Draw the complete UI for one frame.
pub fn draw(app: &mut App, frame: &mut Frame) {
    let [header_area, main_area, status_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(1),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    // Re-derive the column count before anything positions items.
    app.update_columns(main_area.width);

    draw_header(app, frame, header_area);
    if app.feed.is_empty(&app.cache) {
        draw_empty_screen(frame, main_area);
    } else if app.columns() == 1 {
        draw_feed_list(app, frame, main_area);
    } else {
        draw_feed_grid(app, frame, main_area);
    }
    draw_status_bar(app, frame, status_area);

    match app.panel {
        Some(Panel::Detail(index)) => draw_detail_overlay(app, frame, index),
        Some(Panel::Menu(_)) => draw_menu_overlay(frame),
        None => {}
    }
}

fn draw_header(app: &App, frame: &mut Frame, area: Rect) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            format!(" devfeed — {}", app.feed.query()),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("  [{} / {}]", app.settings.density.label(), app.columns()),
            Style::default().fg(Color::DarkGray),
        ),
    ]));
    frame.render_widget(header, area);
}

/// Render the feed as a card grid.
fn draw_feed_grid(app: &mut App, frame: &mut Frame, area: Rect) {
    let items = app.visible_items();
    let columns = app.columns();
    let col_width = area.width / columns as u16;
    let visible_rows = (area.height / CARD_HEIGHT).max(1) as usize;

    // Keep the selected card on screen, never scrolling past the last row.
    let total_rows = row_count(items.len(), columns);
    let selected_row = position(app.selected, columns).row;
    let first_row = selected_row
        .saturating_sub(visible_rows.saturating_sub(1))
        .min(total_rows.saturating_sub(1));

    for (index, item) in items.iter().enumerate() {
        let pos = position(index, columns);
        if pos.row < first_row || pos.row >= first_row + visible_rows {
            continue;
        }
        let cell = Rect {
            x: area.x + pos.column as u16 * col_width,
            y: area.y + (pos.row - first_row) as u16 * CARD_HEIGHT,
            width: col_width,
            height: CARD_HEIGHT.min(area.height - (pos.row - first_row) as u16 * CARD_HEIGHT),
        };
        draw_card(frame, cell, item, index == app.selected);
    }
}

fn draw_card(frame: &mut Frame, cell: Rect, item: &FeedItem, selected: bool) {
    let border_style = if selected {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let block = Block::default().borders(Borders::ALL).border_style(border_style);

    let card = match item {
        FeedItem::Post { post, .. } => Paragraph::new(vec![
            Line::from(Span::styled(
                post.title.clone(),
                Style::default().fg(Color::White),
            )),
            meta_line(post),
            counts_line(post),
        ])
        .wrap(Wrap { trim: true }),
        FeedItem::Ad(ad) => Paragraph::new(vec![
            Line::from(Span::styled(
                ad.title.clone(),
                Style::default().fg(Color::White),
            )),
            Line::from(Span::styled(
                format!("Promoted · {}", ad.company),
                Style::default().fg(Color::Yellow),
            )),
        ])
        .wrap(Wrap { trim: true }),
        FeedItem::Placeholder { .. } => Paragraph::new(vec![
            Line::from(Span::styled("░░░░░░░░░░", Style::default().fg(Color::DarkGray))),
            Line::from(Span::styled("░░░░░░", Style::default().fg(Color::DarkGray))),
        ]),
    };
    frame.render_widget(card.block(block), cell);
}

/// Render the feed as a one-line-per-item list (list mode or very narrow
/// terminals).
fn draw_feed_list(app: &mut App, frame: &mut Frame, area: Rect) {
    let items = app.visible_items();
    let list_items: Vec<ListItem> = items
        .iter()
        .map(|item| match item {
            FeedItem::Post { post, .. } => {
                let marker = match post.vote {
                    Vote::Up => "▲ ",
                    Vote::Down => "▼ ",
                    Vote::None => "  ",
                };
                ListItem::new(Line::from(vec![
                    Span::styled(marker, Style::default().fg(Color::Green)),
                    Span::styled(post.title.clone(), Style::default().fg(Color::White)),
                    Span::raw("  "),
                    Span::styled(
                        format!("[{}]", post.source_name),
                        Style::default().fg(Color::Cyan),
                    ),
                    Span::styled(
                        format!("  ▲{} 💬{}", post.num_upvotes, post.num_comments),
                        Style::default().fg(Color::DarkGray),
                    ),
                    Span::styled(
                        if post.bookmarked { "  ⚑" } else { "" },
                        Style::default().fg(Color::Magenta),
                    ),
                ]))
            }
            FeedItem::Ad(ad) => ListItem::new(Line::from(vec![
                Span::styled("  ", Style::default()),
                Span::styled(ad.title.clone(), Style::default().fg(Color::Yellow)),
                Span::styled("  [promoted]", Style::default().fg(Color::Yellow)),
            ])),
            FeedItem::Placeholder { .. } => ListItem::new(Line::from(Span::styled(
                "  ░░░░░░░░░░░░░░░░",
                Style::default().fg(Color::DarkGray),
            ))),
        })
        .collect();

    let list = List::new(list_items)
        .block(Block::default().borders(Borders::ALL))
        .highlight_style(Style::default().add_modifier(Modifier::BOLD).bg(Color::DarkGray))
        .highlight_symbol("▸ ");

    let mut list_state = ListState::default().with_selected(Some(app.selected));
    frame.render_stateful_widget(list, area, &mut list_state);
}

fn draw_empty_screen(frame: &mut Frame, area: Rect) {
    let message = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            "Nothing in this feed yet",
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Follow more tags or squads, or switch feeds with Tab.",
            Style::default().fg(Color::DarkGray),
        )),
    ])
    .alignment(ratatui::layout::Alignment::Center)
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(message, area);
}

fn draw_status_bar(app: &App, frame: &mut Frame, area: Rect) {
    let posts = app
        .visible_items()
        .iter()
        .filter(|i| i.as_post().is_some())
        .count();
    let error_marker = if app.feed.last_error().is_some() {
        "  ⚠ fetch failed (r: retry)"
    } else {
        ""
    };
    let status = Paragraph::new(Line::from(vec![
        Span::raw(" "),
        Span::styled(&app.status, Style::default().fg(Color::Yellow)),
        Span::styled(error_marker, Style::default().fg(Color::Red)),
        Span::raw("  "),
        Span::styled(
            format!("{posts} posts"),
            Style::default().fg(Color::Green),
        ),
        Span::raw("  q: quit  ↑/↓/←/→: move  ⏎: open  u/d: vote  b: bookmark  m: menu"),
    ]));
    frame.render_widget(status, area);
}

// ---------------------------------------------------------------------------
// Overlays
// ---------------------------------------------------------------------------

fn draw_detail_overlay(app: &App, frame: &mut Frame, index: usize) {
    let items = app.visible_items();
    let Some(FeedItem::Post { post, .. }) = items.get(index) else {
        return;
    };

    let area = centered_rect(frame.area(), 80, 70);
    frame.render_widget(Clear, area);

    let mut lines = vec![
        meta_line(post),
        counts_line(post),
        Line::from(""),
    ];
    if let Some(summary) = &post.summary {
        lines.push(Line::from(summary.clone()));
        lines.push(Line::from(""));
    }
    if !post.tags.is_empty() {
        lines.push(Line::from(Span::styled(
            post.tags
                .iter()
                .map(|t| format!("#{t}"))
                .collect::<Vec<_>>()
                .join(" "),
            Style::default().fg(Color::Cyan),
        )));
    }
    if let Some(url) = &post.url {
        lines.push(Line::from(Span::styled(
            url.clone(),
            Style::default().fg(Color::Blue),
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "n/p: next/prev  u/d: vote  b: bookmark  s: share  x: hide  Esc: close",
        Style::default().fg(Color::DarkGray),
    )));

    let detail = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .title(format!(" {} ", post.title))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        );
    frame.render_widget(detail, area);
}

fn draw_menu_overlay(frame: &mut Frame) {
    let area = centered_rect(frame.area(), 40, 40);
    frame.render_widget(Clear, area);

    let menu = Paragraph::new(vec![
        Line::from("u  toggle upvote"),
        Line::from("b  toggle bookmark"),
        Line::from("o  open link"),
        Line::from("x  hide post"),
        Line::from(""),
        Line::from(Span::styled(
            "Esc  close",
            Style::default().fg(Color::DarkGray),
        )),
    ])
    .block(
        Block::default()
            .title(" Post options ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );
    frame.render_widget(menu, area);
}

// ---------------------------------------------------------------------------
// Small helpers
// ---------------------------------------------------------------------------

fn meta_line(post: &Post) -> Line<'static> {
    let mut spans = vec![Span::styled(
        post.source_name.clone(),
        Style::default().fg(Color::Cyan),
    )];
    if let Some(author) = &post.author {
        spans.push(Span::styled(
            format!(" · @{author}"),
            Style::default().fg(Color::DarkGray),
        ));
    }
    spans.push(Span::styled(
        format!(" · {}", age_label(post.created_at)),
        Style::default().fg(Color::DarkGray),
    ));
    if let Some(minutes) = post.read_time {
        spans.push(Span::styled(
            format!(" · {minutes}m read"),
            Style::default().fg(Color::DarkGray),
        ));
    }
    Line::from(spans)
}

fn counts_line(post: &Post) -> Line<'static> {
    let marker = match post.vote {
        Vote::Up => Span::styled("▲ ", Style::default().fg(Color::Green)),
        Vote::Down => Span::styled("▼ ", Style::default().fg(Color::Red)),
        Vote::None => Span::raw("  "),
    };
    Line::from(vec![
        marker,
        Span::styled(
            format!("▲ {}", post.num_upvotes),
            Style::default().fg(Color::Green),
        ),
        Span::styled(
            format!("  💬 {}", post.num_comments),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(
            if post.bookmarked { "  ⚑ saved" } else { "" },
            Style::default().fg(Color::Magenta),
        ),
    ])
}

/// Relative age, newest-reader style: "3h", "2d", "just now".
fn age_label(created_at: Option<DateTime<Utc>>) -> String {
    let Some(created) = created_at else {
        return "—".to_string();
    };
    let elapsed = Utc::now().signed_duration_since(created);
    if elapsed.num_minutes() < 1 {
        "just now".to_string()
    } else if elapsed.num_hours() < 1 {
        format!("{}m", elapsed.num_minutes())
    } else if elapsed.num_days() < 1 {
        format!("{}h", elapsed.num_hours())
    } else {
        format!("{}d", elapsed.num_days())
    }
}

fn centered_rect(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let [_, vertical, _] = Layout::vertical([
        Constraint::Percentage((100 - percent_y) / 2),
        Constraint::Percentage(percent_y),
        Constraint::Percentage((100 - percent_y) / 2),
    ])
    .areas(area);
    let [_, horizontal, _] = Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Percentage((100 - percent_x) / 2),
    ])
    .areas(vertical);
    horizontal
}

// ---------------------------------------------------------------------------
// Tests (render smoke tests on a TestBackend)
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::NullSink;
    use crate::app::FeedAction;
    use crate::cache::RequestId;
    use crate::fetch::{FetchDispatch, FetchMsg, FetchRequest};
    use crate::feed::testutil::page_of;
    use crate::feed::{FeedError, FeedKind, FeedQuery};
    use crate::settings::Settings;
    use chrono::Duration;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct IdDispatch {
        page_ids: Rc<RefCell<Vec<RequestId>>>,
    }

    impl FetchDispatch for IdDispatch {
        fn dispatch(&self, request: FetchRequest) -> Result<(), FeedError> {
            if let FetchRequest::Page { id, .. } = request {
                self.page_ids.borrow_mut().push(id);
            }
            Ok(())
        }
    }

    fn fresh_app() -> (App, Rc<RefCell<Vec<RequestId>>>) {
        let page_ids = Rc::new(RefCell::new(Vec::new()));
        let app = App::new(
            Settings::default(),
            FeedQuery::new(FeedKind::Popular),
            Box::new(IdDispatch {
                page_ids: page_ids.clone(),
            }),
            Box::new(NullSink),
        );
        (app, page_ids)
    }

    fn deliver(app: &mut App, page_ids: &Rc<RefCell<Vec<RequestId>>>, page: crate::feed::FeedPage) {
        let id = *page_ids.borrow().last().unwrap();
        let query = app.feed.query().clone();
        app.handle_fetch_msg(FetchMsg::Page {
            id,
            query,
            result: Ok(page),
        });
    }

    fn app_with_posts(ids: &[&str]) -> App {
        let (mut app, page_ids) = fresh_app();
        if !ids.is_empty() {
            deliver(&mut app, &page_ids, page_of(ids, None, false));
        }
        app
    }

    fn render(app: &mut App) -> String {
        let backend = TestBackend::new(120, 30);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| draw(app, f)).unwrap();
        let buf = terminal.backend().buffer().clone();
        buf.content()
            .iter()
            .map(|c| c.symbol().chars().next().unwrap_or(' '))
            .collect()
    }

    #[test]
    fn draw_does_not_panic_while_loading() {
        let mut app = app_with_posts(&[]);
        render(&mut app);
    }

    #[test]
    fn draw_shows_post_titles_and_count() {
        let mut app = app_with_posts(&["alpha", "beta"]);
        let text = render(&mut app);
        assert!(text.contains("alpha"));
        assert!(text.contains("2 posts"));
    }

    #[test]
    fn list_mode_renders_single_column() {
        let mut app = app_with_posts(&["alpha"]);
        app.settings.list_mode = true;
        render(&mut app);
        assert_eq!(app.columns(), 1);
    }

    #[test]
    fn detail_overlay_renders_on_top() {
        let mut app = app_with_posts(&["alpha"]);
        app.dispatch_action(FeedAction::Open(0));
        let text = render(&mut app);
        assert!(text.contains("Esc"), "overlay help line visible");
    }

    #[test]
    fn menu_overlay_lists_the_actions() {
        let mut app = app_with_posts(&["alpha"]);
        app.dispatch_action(FeedAction::OpenMenu(0));
        let text = render(&mut app);
        assert!(text.contains("hide post"));
    }

    #[test]
    fn empty_feed_shows_the_empty_screen() {
        let (mut app, page_ids) = fresh_app();
        deliver(&mut app, &page_ids, crate::feed::FeedPage::empty());
        let text = render(&mut app);
        assert!(text.contains("Nothing in this feed yet"));
    }

    #[test]
    fn age_labels_scale_with_elapsed_time() {
        let now = Utc::now();
        assert_eq!(age_label(None), "—");
        assert_eq!(age_label(Some(now)), "just now");
        assert_eq!(age_label(Some(now - Duration::minutes(5))), "5m");
        assert_eq!(age_label(Some(now - Duration::hours(3))), "3h");
        assert_eq!(age_label(Some(now - Duration::days(2))), "2d");
    }
}
