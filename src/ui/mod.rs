use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Tabs, Wrap};
use unicode_width::UnicodeWidthStr;

use crate::app::{App, InputPromptState, OverlayState, Row};
use crate::catalog;
use crate::controller::Tab;
use crate::model::display_timestamp;
use crate::panels::CronField;
use crate::policy::SettingsField;
use crate::sync::LoadState;

mod theme;
use theme::*;

fn cell_width(text: &str) -> u16 {
    UnicodeWidthStr::width(text).min(u16::MAX as usize) as u16
}

/// Lines of a panel body plus the line the cursor sits on.
struct Body<'a> {
    lines: Vec<Line<'a>>,
    selected_line: Option<usize>,
}

impl<'a> Body<'a> {
    fn new() -> Self {
        Self {
            lines: Vec::new(),
            selected_line: None,
        }
    }

    fn info(&mut self, line: Line<'a>) {
        self.lines.push(line);
    }

    fn row(&mut self, line: Line<'a>, selected: bool) {
        if selected {
            self.selected_line = Some(self.lines.len());
            let highlighted = line.patch_style(
                Style::default()
                    .bg(PANEL_HIGHLIGHT_BG)
                    .fg(Color::Black)
                    .add_modifier(Modifier::BOLD),
            );
            self.lines.push(highlighted);
        } else {
            self.lines.push(line);
        }
    }

    fn blank(&mut self) {
        self.lines.push(Line::default());
    }
}

pub fn render(f: &mut Frame<'_>, app: &App) {
    let size = f.size();
    if size.width < 60 || size.height < 16 {
        let block = Paragraph::new("Terminal too small, resize to at least 60x16.")
            .wrap(Wrap { trim: true })
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .title("ClawtBot Settings")
                    .borders(Borders::ALL)
                    .style(Style::default().fg(FG_PRIMARY).bg(MENU_BG)),
            )
            .style(Style::default().fg(FG_PRIMARY).bg(BG_PRIMARY));
        f.render_widget(block, size);
        return;
    }

    let base = Block::default().style(Style::default().bg(BG_PRIMARY));
    f.render_widget(base, size);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(size);

    render_tab_bar(f, app, vertical[0]);
    render_body(f, app, vertical[1]);
    render_status_bar(f, app, vertical[2]);
    render_toast(f, app, vertical[1]);

    if let Some(OverlayState::InputPrompt(state)) = app.overlay.as_ref() {
        render_input_prompt_overlay(f, state);
    }
}

fn render_tab_bar(f: &mut Frame<'_>, app: &App, area: Rect) {
    let titles: Vec<Line> = Tab::ALL
        .iter()
        .enumerate()
        .map(|(idx, tab)| Line::from(format!("{} {}", idx + 1, tab.label())))
        .collect();
    let tabs = Tabs::new(titles)
        .select(app.tab().index())
        .style(Style::default().fg(BAR_TEXT).bg(BAR_BG))
        .highlight_style(
            Style::default()
                .fg(BAR_HIGHLIGHT_TEXT)
                .bg(BAR_HIGHLIGHT_BG)
                .add_modifier(Modifier::BOLD),
        )
        .divider("|");
    f.render_widget(tabs, area);
}

fn render_body(f: &mut Frame<'_>, app: &App, area: Rect) {
    let tab = app.tab();
    let state = match tab {
        Tab::Cron => app.controller.cron.state(),
        Tab::Platforms => app.controller.platforms.state(),
        Tab::Drive => app.controller.drive.state(),
        Tab::AiModels => app.controller.ai_models.state(),
    };
    let mut title = vec![Span::styled(
        format!(" {} ", tab.label()),
        Style::default().fg(BAR_TEXT).add_modifier(Modifier::BOLD),
    )];
    match state {
        LoadState::Idle | LoadState::Loading => {
            title.push(Span::styled("loading… ", Style::default().fg(FG_DIM)));
        }
        LoadState::Fallback => {
            title.push(Span::styled(
                "backend unavailable, showing defaults ",
                Style::default().fg(STATUS_FAILED),
            ));
        }
        LoadState::Ready => {}
    }
    let block = Block::default()
        .title(Line::from(title))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(BORDER_IDLE))
        .style(Style::default().fg(FG_PRIMARY).bg(BG_PRIMARY));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let selected = app.selected_row();
    let body = match tab {
        Tab::Cron => cron_body(app, selected.as_ref()),
        Tab::Platforms => platforms_body(app, selected.as_ref()),
        Tab::Drive => drive_body(app, selected.as_ref()),
        Tab::AiModels => models_body(app, selected.as_ref()),
    };

    let height = inner.height as usize;
    let scroll = match body.selected_line {
        Some(line) if height > 0 && line >= height => line + 1 - height,
        _ => 0,
    };
    let paragraph = Paragraph::new(body.lines).scroll((scroll.min(u16::MAX as usize) as u16, 0));
    f.render_widget(paragraph, inner);
}

fn cron_body<'a>(app: &'a App, selected: Option<&Row>) -> Body<'a> {
    let panel = &app.controller.cron;
    let mut body = Body::new();
    body.info(Line::styled(
        "Daily scheduler, engagement follow-up and weekly analytics report.",
        Style::default().fg(FG_DIM),
    ));
    body.blank();
    for field in CronField::ALL {
        if matches!(field, CronField::EngagementDelayHours | CronField::AnalyticsDayOfWeek | CronField::Timezone) {
            body.blank();
        }
        let line = Line::from(vec![
            Span::raw(format!("  {:<26}", field.label())),
            Span::styled("◀ ", Style::default().fg(FG_DIM)),
            Span::styled(
                panel.display_value(field),
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            ),
            Span::styled(" ▶", Style::default().fg(FG_DIM)),
        ]);
        body.row(line, selected == Some(&Row::CronField(field)));
    }
    body.blank();
    let label = if panel.is_saving() {
        "  [ Saving... ]"
    } else {
        "  [ Save Schedules ]"
    };
    body.row(
        Line::styled(label, Style::default().fg(ACCENT)),
        selected == Some(&Row::CronSave),
    );
    body
}

fn platforms_body<'a>(app: &'a App, selected: Option<&Row>) -> Body<'a> {
    let panel = &app.controller.platforms;
    let mut body = Body::new();
    for plat in panel.platforms() {
        let key = plat.platform.as_str();
        let is_expanded = panel.expanded() == Some(key);
        let mut header = vec![
            Span::raw(if is_expanded { "▾ " } else { "▸ " }),
            Span::styled(
                format!("{:<12}", catalog::platform_label(key)),
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            ),
            Span::styled(panel.status_line(key), Style::default().fg(tone_color(plat.tone()))),
        ];
        if panel.shows_active_badge(key) {
            header.push(Span::styled("  [Active]", Style::default().fg(STATUS_CONNECTED)));
        }
        body.row(Line::from(header), selected == Some(&Row::Platform(plat.platform.clone())));

        if !is_expanded {
            continue;
        }
        if plat.is_configured() {
            body.info(Line::styled(
                "    Current credentials (masked)",
                Style::default().fg(FG_DIM),
            ));
            for (field, masked) in &plat.masked_credentials {
                body.info(Line::styled(
                    format!("      {field:<22}{masked}"),
                    Style::default().fg(FG_DIM),
                ));
            }
        }
        for spec in catalog::platform_fields(key) {
            let draft = panel.field_value(key, spec.key);
            let value = if draft.is_empty() {
                Span::styled(spec.placeholder, Style::default().fg(FG_DIM))
            } else {
                Span::raw("•".repeat(draft.chars().count().min(24)))
            };
            let row = Row::PlatformField {
                platform: plat.platform.clone(),
                field: spec.key,
            };
            body.row(
                Line::from(vec![Span::raw(format!("    {:<22}", spec.label)), value]),
                selected == Some(&row),
            );
        }
        let mut actions = vec![if panel.is_saving(key) {
            "Saving..."
        } else {
            "s Save Keys"
        }];
        if panel.can_test(key) {
            actions.push(if panel.is_testing(key) {
                "Testing..."
            } else {
                "t Test Connection"
            });
            actions.push(if panel.is_removing(key) {
                "Removing..."
            } else {
                "x Remove"
            });
        }
        body.info(Line::styled(
            format!("    {}", actions.join(" · ")),
            Style::default().fg(ACCENT),
        ));
        body.blank();
    }
    body
}

fn drive_body<'a>(app: &'a App, selected: Option<&Row>) -> Body<'a> {
    let panel = &app.controller.drive;
    let config = panel.config();
    let mut body = Body::new();
    body.info(Line::styled(
        "Connect a Drive folder to fetch content assets (images, videos, documents).",
        Style::default().fg(FG_DIM),
    ));
    body.blank();
    if config.is_connected {
        body.info(Line::from(vec![
            Span::styled("● Connected  ", Style::default().fg(STATUS_CONNECTED)),
            Span::styled(
                format!("Folder ID: {}", config.folder_id.as_deref().unwrap_or("-")),
                Style::default().fg(FG_DIM),
            ),
        ]));
        if let Some(synced) = config.last_synced_at.as_ref() {
            body.info(Line::styled(
                format!("  Last synced: {}", display_timestamp(synced)),
                Style::default().fg(FG_DIM),
            ));
        }
        body.blank();
    }
    let url = if panel.folder_url().is_empty() {
        Span::styled(
            "https://drive.google.com/drive/folders/1ABC...",
            Style::default().fg(FG_DIM),
        )
    } else {
        Span::raw(panel.folder_url())
    };
    body.row(
        Line::from(vec![Span::raw("  Folder URL  "), url]),
        selected == Some(&Row::DriveUrl),
    );
    body.blank();
    body.row(
        Line::styled(format!("  [ {} ]", panel.connect_label()), Style::default().fg(ACCENT)),
        selected == Some(&Row::DriveConnect),
    );
    if config.is_connected {
        let label = if panel.is_disconnecting() {
            "  [ Disconnecting... ]"
        } else {
            "  [ Disconnect ]"
        };
        body.row(
            Line::styled(label, Style::default().fg(STATUS_FAILED)),
            selected == Some(&Row::DriveDisconnect),
        );
    }
    body
}

fn models_body<'a>(app: &'a App, selected: Option<&Row>) -> Body<'a> {
    let panel = &app.controller.ai_models;
    let mut body = Body::new();
    body.info(Line::styled(
        "Provider API Keys  (Ollama is free and runs locally)",
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
    ));
    for prov in panel.providers() {
        let key = prov.provider.as_str();
        let mut spans = vec![Span::styled(
            format!("  {:<16}", catalog::provider_label(key)),
            Style::default().fg(Color::White),
        )];
        if prov.is_configured {
            spans.push(Span::styled(
                if prov.is_local() { "Local " } else { "Configured " },
                Style::default().fg(STATUS_CONNECTED),
            ));
        }
        if let Some(status) = prov.test_status.as_deref() {
            spans.push(Span::styled(
                format!("• {status} "),
                Style::default().fg(tone_color(prov.tone())),
            ));
        }
        if let Some(masked) = prov.masked_key.as_deref() {
            spans.push(Span::styled(format!(" key {masked}"), Style::default().fg(FG_DIM)));
        }
        if panel.is_saving_key(key) {
            spans.push(Span::styled("  saving...", Style::default().fg(ACCENT)));
        }
        if panel.is_testing(key) {
            spans.push(Span::styled("  testing...", Style::default().fg(ACCENT)));
        }
        if let Some(spec) = catalog::provider(key) {
            spans.push(Span::styled(format!("  {}", spec.description), Style::default().fg(FG_DIM)));
        }
        body.row(Line::from(spans), selected == Some(&Row::Provider(prov.provider.clone())));
    }

    body.blank();
    body.info(Line::styled(
        "Agent Model Assignments",
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
    ));
    for agent in panel.agents() {
        let id = agent.agent_id.as_str();
        let (provider, model) = panel
            .assignment(id)
            .unwrap_or((agent.provider.as_str(), agent.model.as_str()));
        let mut spans = vec![
            Span::styled(
                format!("  {:<20}", catalog::agent_label(id)),
                Style::default().fg(Color::White),
            ),
            Span::raw(format!("◀ {} ▶ ", catalog::provider_label(provider))),
            Span::raw(format!("[ {model} ]")),
        ];
        if panel.is_saving_agent(id) {
            spans.push(Span::styled("  saving...", Style::default().fg(ACCENT)));
        } else if agent.is_custom {
            spans.push(Span::styled("  custom · x reset", Style::default().fg(BORDER_FOCUS)));
        }
        body.row(Line::from(spans), selected == Some(&Row::Agent(agent.agent_id.clone())));
    }
    body
}

/// Key hints for the selected row, including whether edits apply at once.
fn row_hint(row: Option<&Row>) -> String {
    match row {
        Some(Row::CronField(field)) => format!(
            "←/→ adjust · Enter type value ({})",
            SettingsField::Cron(*field).hint()
        ),
        Some(Row::CronSave) => String::from("Enter save schedules"),
        Some(Row::Platform(_)) => String::from("Enter expand · s save · t test · x remove"),
        Some(Row::PlatformField { .. }) => format!(
            "Enter edit field ({})",
            SettingsField::PlatformCredential.hint()
        ),
        Some(Row::DriveUrl) => format!("Enter edit URL ({})", SettingsField::DriveFolderUrl.hint()),
        Some(Row::DriveConnect) | Some(Row::DriveDisconnect) => String::from("Enter confirm"),
        Some(Row::Provider(_)) => format!(
            "Enter set key ({}) · t test · x delete key",
            SettingsField::ProviderApiKey.hint()
        ),
        Some(Row::Agent(_)) => format!(
            "←/→ provider · [/] model ({}) · x reset",
            SettingsField::AgentProvider.hint()
        ),
        None => String::new(),
    }
}

fn render_status_bar(f: &mut Frame<'_>, app: &App, area: Rect) {
    f.render_widget(Clear, area);
    let hint = row_hint(app.selected_row().as_ref());
    let mut spans = vec![Span::styled(
        format!(" {} ", app.status_message),
        Style::default().fg(BAR_TEXT).bg(BAR_BG),
    )];
    let pending = app.controller.pending_jobs();
    if pending > 0 {
        spans.push(Span::styled(
            format!("[{pending} pending] "),
            Style::default().fg(BAR_HIGHLIGHT_TEXT).bg(BAR_HIGHLIGHT_BG),
        ));
    }
    let used: u16 = spans.iter().map(|span| cell_width(&span.content)).sum();
    let remaining = area.width.saturating_sub(used) as usize;
    let hint = format!("{hint} · Tab panels · r reload · q quit ");
    let padded = format!("{hint:>remaining$}");
    spans.push(Span::styled(padded, Style::default().fg(BAR_TEXT).bg(BAR_BG)));

    let paragraph = Paragraph::new(Line::from(spans))
        .style(Style::default().fg(BAR_TEXT).bg(BAR_BG))
        .alignment(Alignment::Left);
    f.render_widget(paragraph, area);
}

fn render_toast(f: &mut Frame<'_>, app: &App, body: Rect) {
    let Some(toast) = app.controller.toast() else {
        return;
    };
    let width = (cell_width(&toast.message) + 4).min(body.width.saturating_sub(2)).max(10);
    let area = Rect {
        x: body.x + body.width.saturating_sub(width + 1),
        y: body.y + body.height.saturating_sub(4),
        width,
        height: 3,
    };
    f.render_widget(Clear, area);
    let color = toast_color(toast.kind);
    let widget = Paragraph::new(toast.message.as_str())
        .wrap(Wrap { trim: true })
        .style(Style::default().fg(Color::White).bg(MENU_BG))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(color))
                .style(Style::default().bg(MENU_BG)),
        );
    f.render_widget(widget, area);
}

fn render_input_prompt_overlay(f: &mut Frame<'_>, state: &InputPromptState) {
    let area = centered_rect(60, 30, f.size());
    f.render_widget(Clear, area);
    let block = Block::default()
        .title(Span::styled(
            state.title.as_str(),
            Style::default().fg(BAR_TEXT).add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(MENU_BORDER))
        .style(Style::default().bg(MENU_BG));
    f.render_widget(block.clone(), area);
    let inner = block.inner(area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(inner);

    let placeholder =
        Paragraph::new(state.placeholder.as_str()).style(Style::default().fg(FG_DIM).bg(MENU_BG));
    f.render_widget(placeholder, chunks[0]);

    let mut input_spans = vec![Span::styled("> ", Style::default().fg(FG_PRIMARY))];
    if state.value.is_empty() {
        input_spans.push(Span::styled("(empty)", Style::default().fg(FG_DIM)));
    } else {
        input_spans.push(Span::styled(
            state.display_value(),
            Style::default().fg(Color::White),
        ));
    }
    input_spans.push(Span::styled(" ▍", Style::default().fg(BORDER_FOCUS)));
    let input = Paragraph::new(Line::from(input_spans))
        .style(Style::default().bg(MENU_BG))
        .alignment(Alignment::Left);
    f.render_widget(input, chunks[1]);

    let policy_hint = Paragraph::new(state.action.field().hint())
        .style(Style::default().fg(FG_DIM).bg(MENU_BG));
    f.render_widget(policy_hint, chunks[2]);

    if let Some(error) = state.error.as_ref() {
        let error_widget =
            Paragraph::new(error.as_str()).style(Style::default().fg(STATUS_FAILED).bg(MENU_BG));
        f.render_widget(error_widget, chunks[3]);
    } else {
        let hint = Paragraph::new("Enter confirm · Esc cancel · Ctrl+U clear")
            .style(Style::default().fg(FG_DIM).bg(MENU_BG));
        f.render_widget(hint, chunks[3]);
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::InMemorySettingsApi;
    use crate::controller::SettingsController;
    use crate::sync::SharedApi;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use std::sync::Arc;
    use std::time::Duration;

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let mut text = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                text.push_str(buffer.get(x, y).symbol());
            }
            text.push('\n');
        }
        text
    }

    #[tokio::test]
    async fn renders_default_platform_cards_and_toast() {
        let api: SharedApi = Arc::new(InMemorySettingsApi::new());
        let controller = SettingsController::new(api, Duration::from_secs(3));
        let mut app = App::new(controller, Duration::from_millis(250));
        app.controller.activate_tab(Tab::Platforms);
        app.controller.settle().await;
        app.controller.save_platform("twitter");

        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|frame| render(frame, &app)).unwrap();
        let text = screen_text(&terminal);

        for label in ["Instagram", "Facebook", "Twitter", "YouTube"] {
            assert!(text.contains(label), "missing {label}");
        }
        assert!(text.contains("Not configured"));
        assert!(text.contains("Please fill in at least one credential field"));
    }

    #[test]
    fn tiny_terminal_shows_resize_hint() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let _guard = rt.enter();
        let api: SharedApi = Arc::new(InMemorySettingsApi::new());
        let app = App::new(SettingsController::new(api, Duration::from_secs(3)), Duration::from_millis(250));

        let mut terminal = Terminal::new(TestBackend::new(40, 10)).unwrap();
        terminal.draw(|frame| render(frame, &app)).unwrap();
        assert!(screen_text(&terminal).contains("Terminal"));
    }
}
