mod app;
mod commands;
mod event;
mod ui;

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph};
use tracing::{info, warn};

use codesprint::config::Config;
use codesprint::content::ChapterCatalog;
use codesprint::logging;
use codesprint::store::JsonStore;

use app::{App, AppScreen};
use commands::Command;
use event::{AppEvent, EventHandler};
use ui::components::chapter_list::ChapterList;
use ui::components::dashboard::Dashboard;
use ui::components::leaderboard_table::LeaderboardTable;
use ui::components::progress_bar::ProgressBar;
use ui::components::stats_panel::StatsPanel;
use ui::components::stats_sidebar::StatsSidebar;
use ui::components::typing_area::TypingArea;
use ui::layout::{AppLayout, centered_rect, pack_hint_lines};
use ui::theme::Theme;

#[derive(Parser)]
#[command(name = "codesprint", version, about = "Terminal typing practice on real code")]
struct Cli {
    #[arg(short, long, help = "Profile name")]
    user: Option<String>,

    #[arg(short, long, help = "Language filter (or \"all\")")]
    language: Option<String>,

    #[arg(short, long, help = "Theme name")]
    theme: Option<String>,

    #[arg(long, help = "Directory for profiles and the leaderboard")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load().unwrap_or_else(|e| {
        eprintln!("warning: ignoring invalid config: {e:#}");
        Config::default()
    });
    if let Some(user) = cli.user {
        config.username = user;
    }
    if let Some(language) = cli.language {
        config.default_language = language;
    }
    if let Some(theme) = cli.theme {
        config.theme = theme;
    }
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir.to_string_lossy().to_string();
    }
    config.validate();

    if let Err(e) = logging::init(&config, &config.log_path()) {
        eprintln!("warning: logging disabled: {e:#}");
    }

    let catalog = ChapterCatalog::load(&config.chapters_path())?;
    config.normalize_language(&catalog.languages());
    let store = JsonStore::with_base_dir(config.data_path())?;
    if store.check_interrupted_import(&config.user_id()) {
        warn!("cleaned up files from an interrupted import");
    }
    info!(user = %config.user_id(), chapters = catalog.len(), "starting");

    if let Some(command) = cli.command {
        return commands::run(command, &config, &catalog, &store, &mut io::stdout());
    }

    let theme = Theme::load(&config.theme).unwrap_or_else(|| {
        warn!(
            theme = %config.theme,
            available = ?Theme::available_themes(),
            "unknown theme, using default"
        );
        Theme::default()
    });
    let mut app = App::new(config, theme, catalog, Some(store));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let events = EventHandler::new(Duration::from_millis(100));

    let result = run_app(&mut terminal, &mut app, &events);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        eprintln!("Error: {err:?}");
    }

    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &EventHandler,
) -> Result<()> {
    loop {
        terminal.draw(|frame| render(frame, app))?;

        match events.next()? {
            AppEvent::Key(key) => handle_key(app, key),
            AppEvent::Tick | AppEvent::Resize => {}
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Only process Press events; Repeat would inflate input
    if key.kind != KeyEventKind::Press {
        return;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.should_quit = true;
        return;
    }

    match app.screen {
        AppScreen::ChapterSelect => handle_chapters_key(app, key),
        AppScreen::Practice => handle_practice_key(app, key),
        AppScreen::Result => handle_result_key(app, key),
        AppScreen::Leaderboard => handle_leaderboard_key(app, key),
        AppScreen::Stats => handle_stats_key(app, key),
    }
}

fn handle_chapters_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
        KeyCode::Up | KeyCode::Char('k') => app.select_prev(),
        KeyCode::Down | KeyCode::Char('j') => app.select_next(),
        KeyCode::Char('l') => app.cycle_language(),
        KeyCode::Char('r') => app.start_random(),
        KeyCode::Char('b') => app.go_to_leaderboard(),
        KeyCode::Char('s') => app.go_to_stats(),
        KeyCode::Enter => app.start_selected(),
        _ => {}
    }
}

fn handle_practice_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.escape(),
        KeyCode::Backspace => app.backspace(),
        KeyCode::Enter => app.type_char('\n'),
        KeyCode::Tab => app.tab(),
        KeyCode::Char(ch) => app.type_char(ch),
        _ => {}
    }
}

fn handle_result_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('r') => app.retry(),
        KeyCode::Char('q') | KeyCode::Esc => app.go_to_chapters(),
        KeyCode::Char('b') => app.go_to_leaderboard(),
        _ => {}
    }
}

fn handle_leaderboard_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Tab => app.toggle_rank_by(),
        KeyCode::Char('l') => app.cycle_board_language(),
        KeyCode::Char('q') | KeyCode::Esc => app.go_to_chapters(),
        _ => {}
    }
}

fn handle_stats_key(app: &mut App, key: KeyEvent) {
    if matches!(key.code, KeyCode::Char('q') | KeyCode::Esc) {
        app.go_to_chapters();
    }
}

fn render(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let colors = &app.theme.colors;

    let bg = Block::default().style(Style::default().bg(colors.bg()));
    frame.render_widget(bg, area);

    match app.screen {
        AppScreen::ChapterSelect => render_chapters(frame, app),
        AppScreen::Practice => render_practice(frame, app),
        AppScreen::Result => render_result(frame, app),
        AppScreen::Leaderboard => render_leaderboard(frame, app),
        AppScreen::Stats => render_stats(frame, app),
    }
}

fn header_line<'a>(app: &App, title: &'a str, info: String) -> Paragraph<'a> {
    let colors = &app.theme.colors;
    Paragraph::new(Line::from(vec![
        Span::styled(
            format!(" {title} "),
            Style::default()
                .fg(colors.header_fg())
                .bg(colors.header_bg())
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            info,
            Style::default()
                .fg(colors.text_pending())
                .bg(colors.header_bg()),
        ),
    ]))
    .style(Style::default().bg(colors.header_bg()))
}

fn footer_paragraph(app: &App, hints: &[&str], width: u16) -> Paragraph<'static> {
    let colors = &app.theme.colors;
    let lines: Vec<Line> = pack_hint_lines(hints, width as usize)
        .into_iter()
        .take(1)
        .map(|l| Line::from(Span::styled(l, Style::default().fg(colors.text_pending()))))
        .collect();
    Paragraph::new(lines)
}

fn render_chapters(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    let streak = codesprint::engine::streak::compute_streak(
        &app.history.entries,
        Utc::now().date_naive(),
    );
    let done = app.progress.chapters.values().filter(|p| p.completed).count();
    let info = format!(
        " {} | {}/{} chapters | {} day streak",
        app.config.username,
        done,
        app.catalog.len(),
        streak
    );
    frame.render_widget(header_line(app, "codesprint", info), layout[0]);

    let chapters = app.visible_chapters();
    let list_area = centered_rect(80, 90, layout[1]);
    frame.render_widget(
        ChapterList::new(
            &chapters,
            app.chapter_selected,
            app.language(),
            &app.progress.chapters,
            &app.theme,
        ),
        list_area,
    );

    let hints = [
        "[Enter] Start",
        "[j/k] Move",
        "[l] Language",
        "[r] Random",
        "[b] Leaderboard",
        "[s] Stats",
        "[q] Quit",
    ];
    frame.render_widget(footer_paragraph(app, &hints, area.width), layout[2]);
}

fn render_practice(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let (Some(session), Some(chapter)) = (&app.session, &app.chapter) else {
        return;
    };

    let app_layout = AppLayout::new(area);
    let tier = app_layout.tier;
    let stats = session.stats();

    let info = if tier.show_sidebar() {
        format!(" {} | {}", chapter.language, chapter.level)
    } else {
        format!(
            " WPM {} | Acc {}% | Errors {}",
            stats.wpm, stats.accuracy, stats.error_count
        )
    };
    frame.render_widget(header_line(app, &chapter.title, info), app_layout.header);

    let show_progress = tier.show_progress_bar(area.height);
    let mut constraints = vec![Constraint::Min(5)];
    if show_progress {
        constraints.push(Constraint::Length(3));
    }
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(app_layout.main);

    let title = if session.is_paused() {
        "Paused: type to resume"
    } else {
        chapter.category.as_str()
    };
    frame.render_widget(TypingArea::new(session, title, &app.theme), main_layout[0]);

    if show_progress {
        frame.render_widget(
            ProgressBar::new("Progress", stats.progress_percent, &app.theme),
            main_layout[1],
        );
    }

    if let Some(sidebar_area) = app_layout.sidebar {
        let sidebar = StatsSidebar::new(
            stats,
            session.is_paused(),
            app.chapter_best(),
            app.chapter_history(),
            &app.theme,
        );
        frame.render_widget(sidebar, sidebar_area);
    }

    let hints = if session.is_paused() {
        vec!["[Esc] Back to chapters", "[any key] Resume"]
    } else {
        vec!["[Esc] Pause", "[Backspace] Delete", "[Enter] Newline", "[Tab] Indent"]
    };
    frame.render_widget(
        footer_paragraph(app, &hints, area.width),
        app_layout.footer,
    );
}

fn render_result(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let (Some(result), Some(chapter)) = (&app.last_result, &app.chapter) else {
        return;
    };

    let rank = app.own_rank(&chapter.language);
    let streak = codesprint::engine::streak::compute_streak(
        &app.history.entries,
        result.completed_at.date_naive(),
    );
    let centered = centered_rect(60, 60, area);
    let dashboard = Dashboard::new(&chapter.title, result, &app.theme)
        .recorded(app.last_recorded.as_ref())
        .rank(rank.as_ref())
        .streak(streak);
    frame.render_widget(dashboard, centered);
}

fn render_leaderboard(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let rows = app.leaderboard_rows();
    let own = app.own_rank(app.board_language());
    let table = LeaderboardTable::new(
        &rows,
        own.as_ref(),
        &app.user_id,
        app.board_language(),
        app.rank_by,
        &app.theme,
    );
    frame.render_widget(table, centered_rect(80, 80, area));
}

fn render_stats(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let summary = app.summary(Utc::now().date_naive());
    let panel = StatsPanel::new(
        &app.config.username,
        &summary,
        app.catalog.len(),
        &app.history.entries,
        &app.theme,
    );
    frame.render_widget(panel, centered_rect(85, 80, area));
}
