//! Keyboard input handling.
//!
//! Maps terminal key events to [`FeedAction`]s and [`App`] navigation.
//! Adding a new keybinding is a single match arm in [`handle_key_event`];
//! the action itself lives on [`App::dispatch_action`].

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};

use crate::app::{App, FeedAction, Panel};

/// Process a single key event, updating app state accordingly.
///
/// Only reacts to key-press events (ignoring release / repeat) so that each
/// physical keypress triggers exactly one action. Keys are interpreted
/// against the open panel first: an overlay or menu captures input until it
/// is closed.
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }

    match app.panel {
        Some(Panel::Detail(index)) => handle_detail_key(app, key.code, index),
        Some(Panel::Menu(index)) => handle_menu_key(app, key.code, index),
        None => handle_feed_key(app, key.code),
    }
}

fn handle_detail_key(app: &mut App, code: KeyCode, index: usize) {
    match code {
        KeyCode::Esc | KeyCode::Char('q') => app.dispatch_action(FeedAction::ClosePanel),
        KeyCode::Char('n') | KeyCode::Right => app.detail_step(true),
        KeyCode::Char('p') | KeyCode::Left => app.detail_step(false),
        KeyCode::Char('u') => app.dispatch_action(FeedAction::Upvote(index)),
        KeyCode::Char('d') => app.dispatch_action(FeedAction::Downvote(index)),
        KeyCode::Char('b') => app.dispatch_action(FeedAction::Bookmark(index)),
        KeyCode::Char('s') => app.dispatch_action(FeedAction::Share(index)),
        KeyCode::Char('o') | KeyCode::Enter => app.dispatch_action(FeedAction::OpenLink(index)),
        KeyCode::Char('x') => app.dispatch_action(FeedAction::Remove(index)),
        _ => {}
    }
}

fn handle_menu_key(app: &mut App, code: KeyCode, index: usize) {
    match code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('m') => {
            app.dispatch_action(FeedAction::ClosePanel)
        }
        KeyCode::Char('u') => {
            app.dispatch_action(FeedAction::Upvote(index));
            app.dispatch_action(FeedAction::ClosePanel);
        }
        KeyCode::Char('b') => {
            app.dispatch_action(FeedAction::Bookmark(index));
            app.dispatch_action(FeedAction::ClosePanel);
        }
        KeyCode::Char('o') => {
            app.dispatch_action(FeedAction::OpenLink(index));
            app.dispatch_action(FeedAction::ClosePanel);
        }
        // remove() closes the panel itself.
        KeyCode::Char('x') => app.dispatch_action(FeedAction::Remove(index)),
        _ => {}
    }
}

fn handle_feed_key(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Char('q') | KeyCode::Esc => app.quit = true,
        KeyCode::Down | KeyCode::Char('j') => app.select_row_down(),
        KeyCode::Up | KeyCode::Char('k') => app.select_row_up(),
        KeyCode::Left | KeyCode::Char('h') => app.move_selection(-1),
        KeyCode::Right | KeyCode::Char('l') => app.move_selection(1),
        KeyCode::Home | KeyCode::Char('g') => app.select_first(),
        KeyCode::End | KeyCode::Char('G') => app.select_last(),
        KeyCode::Enter => app.dispatch_action(FeedAction::Open(app.selected)),
        KeyCode::Char('o') => app.dispatch_action(FeedAction::OpenLink(app.selected)),
        KeyCode::Char('u') => app.dispatch_action(FeedAction::Upvote(app.selected)),
        KeyCode::Char('d') => app.dispatch_action(FeedAction::Downvote(app.selected)),
        KeyCode::Char('b') => app.dispatch_action(FeedAction::Bookmark(app.selected)),
        KeyCode::Char('c') => app.dispatch_action(FeedAction::Comment(app.selected)),
        KeyCode::Char('s') => app.dispatch_action(FeedAction::Share(app.selected)),
        KeyCode::Char('x') => app.dispatch_action(FeedAction::Remove(app.selected)),
        KeyCode::Char('m') => app.dispatch_action(FeedAction::OpenMenu(app.selected)),
        KeyCode::Char('L') => app.toggle_list_mode(),
        KeyCode::Char('D') => app.cycle_density(),
        KeyCode::Char('t') => app.toggle_ranking(),
        KeyCode::Char('r') => app.refresh(),
        KeyCode::Tab => app.cycle_feed(),
        _ => {}
    }
}
