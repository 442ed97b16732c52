// UI rendering logic
//
// All rendering lives here. Each frame renders the chrome (title bar, log
// panel, status bar) and the view for the current route. Until the session
// probe resolves, a full-page loading indicator is the only thing drawn -
// no route is mounted before the gate has an answer.

use super::app::{App, FormMode};
use super::theme::Theme;
use crate::forms::FieldErrors;
use crate::logging::LogLevel;
use crate::pages::sources::SelectionContext;
use crate::session::Route;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Gauge, List, ListItem, Paragraph, Row, Table, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

/// Main render function - called on every frame
pub fn draw(f: &mut Frame, app: &App) {
    let theme = Theme::for_mode(app.dark_mode);
    let base = Block::default().style(theme.base());
    f.render_widget(base, f.area());

    // The whole UI is suppressed until the load probe resolves
    if !app.gate.is_resolved() {
        draw_session_check(f, f.area(), &theme);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Min(10),   // Route content
            Constraint::Length(6), // System logs
            Constraint::Length(3), // Status bar
        ])
        .split(f.area());

    draw_title(f, chunks[0], app, &theme);

    match app.route {
        Route::Landing => draw_landing(f, chunks[1], app, &theme),
        Route::CardPayment => draw_payment(f, chunks[1], app, &theme),
        Route::PaymentSuccess => draw_payment_success(f, chunks[1], &theme),
        Route::AddSources => draw_add_sources(f, chunks[1], app, &theme),
        Route::Dashboard => draw_dashboard(f, chunks[1], app, &theme),
        Route::SentimentAnalysis => draw_sentiment(f, chunks[1], app, &theme),
        Route::FeatureIdentification => draw_features(f, chunks[1], app, &theme),
        Route::CompetitorAnalysis => draw_competitor(f, chunks[1], app, &theme),
    }

    draw_logs_panel(f, chunks[2], app, &theme);
    draw_status(f, chunks[3], app, &theme);
}

/// Full-page indicator while the auth probe is in flight
fn draw_session_check(f: &mut Frame, area: Rect, theme: &Theme) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border));
    let text = Paragraph::new("\n\nChecking session...")
        .alignment(Alignment::Center)
        .style(theme.muted_style())
        .block(block);
    f.render_widget(text, area);
}

fn draw_title(f: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    let badge = match app.route {
        Route::Dashboard => app.dashboard.badge(),
        Route::SentimentAnalysis => app.sentiment.badge(),
        Route::FeatureIdentification => app.features.badge(),
        _ => None,
    };

    let mut spans = vec![
        Span::styled("Smart Reviews", theme.title_style()),
        Span::raw("  |  "),
        Span::styled(app.route.title(), Style::default().add_modifier(Modifier::BOLD)),
    ];
    if let Some(badge) = badge {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(format!("[{}]", badge), theme.badge_style()));
    }
    if let Some(app_entry) = app.store.current_app() {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            format!("({})", app_entry.name),
            theme.muted_style(),
        ));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border));
    f.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

// ── Landing, auth forms ─────────────────────────────────────────────────────

fn draw_landing(f: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    match app.form_mode {
        FormMode::Login => draw_form(
            f,
            area,
            app,
            theme,
            "Sign In",
            &[
                ("Email", &app.login_form.username, false),
                ("Password", &app.login_form.password, true),
            ],
            &app.login_errors,
            &["username", "password"],
        ),
        FormMode::Signup => draw_form(
            f,
            area,
            app,
            theme,
            "Create Account",
            &[
                ("Username", &app.signup_form.username, false),
                ("Email", &app.signup_form.email, false),
                ("Password", &app.signup_form.password, true),
                ("Confirm password", &app.signup_form.password2, true),
            ],
            &app.signup_errors,
            &["username", "email", "password", "password2"],
        ),
        _ => {
            let lines = vec![
                Line::from(""),
                Line::from(Span::styled(
                    "  Understand what your users think.",
                    theme.title_style(),
                )),
                Line::from(""),
                Line::from("  Review analytics for your app: sentiment trends, feature"),
                Line::from("  requests, and competitor comparisons in one dashboard."),
                Line::from(""),
                Line::from(vec![
                    Span::raw("  Press "),
                    Span::styled("l", theme.title_style()),
                    Span::raw(" to sign in, "),
                    Span::styled("s", theme.title_style()),
                    Span::raw(" to create an account."),
                ]),
            ];
            let block = Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.border));
            f.render_widget(Paragraph::new(lines).block(block), area);
        }
    }
}

/// Generic form renderer: one row per field, the focused one highlighted,
/// field errors inline underneath
#[allow(clippy::too_many_arguments)]
fn draw_form(
    f: &mut Frame,
    area: Rect,
    app: &App,
    theme: &Theme,
    title: &str,
    fields: &[(&str, &String, bool)],
    errors: &FieldErrors,
    error_keys: &[&str],
) {
    let mut lines = vec![Line::from("")];
    for (i, (label, value, masked)) in fields.iter().enumerate() {
        let shown = if *masked {
            "*".repeat(value.chars().count())
        } else {
            (*value).clone()
        };
        let focused = app.form_focus == i;
        let marker = if focused { "> " } else { "  " };
        let style = if focused {
            Style::default()
                .bg(theme.selected_bg)
                .fg(theme.selected_fg)
        } else {
            Style::default().fg(theme.fg)
        };
        lines.push(Line::from(vec![
            Span::raw(marker),
            Span::styled(format!("{:<18}", format!("{}:", label)), theme.muted_style()),
            Span::styled(shown, style),
            Span::styled(if focused { "_" } else { "" }, style),
        ]));
        if let Some(message) = error_keys.get(i).and_then(|key| errors.get(*key)) {
            lines.push(Line::from(Span::styled(
                format!("    {}", message),
                Style::default().fg(theme.negative),
            )));
        }
    }

    lines.push(Line::from(""));
    if app.submitting {
        lines.push(Line::from(Span::styled(
            "  Submitting...",
            theme.muted_style(),
        )));
    } else {
        lines.push(Line::from(Span::styled(
            "  Enter submits - Tab next field - Esc cancels",
            theme.muted_style(),
        )));
    }
    if let Some(banner) = &app.banner {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("  {}", banner),
            Style::default().fg(theme.negative),
        )));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(format!(" {} ", title), theme.title_style()))
        .border_style(Style::default().fg(theme.border));
    f.render_widget(Paragraph::new(lines).block(block), area);
}

// ── Payment ─────────────────────────────────────────────────────────────────

fn draw_payment(f: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    draw_form(
        f,
        area,
        app,
        theme,
        "Card Payment - $29.00/month",
        &[
            ("Cardholder name", &app.payment_form.cardholder_name, false),
            ("Card number", &app.payment_form.card_number, false),
            ("Expiry (MM/YY)", &app.payment_form.expiry_date, false),
            ("CVC", &app.payment_form.cvc, true),
            ("Address", &app.payment_form.address_line, false),
            ("City", &app.payment_form.city, false),
            ("State", &app.payment_form.state, false),
            ("Postal code", &app.payment_form.postal_code, false),
        ],
        &app.payment_errors,
        &[
            "cardholder_name",
            "card_number",
            "expiry_date",
            "cvc",
            "address_line",
            "city",
            "state",
            "postal_code",
        ],
    );
}

fn draw_payment_success(f: &mut Frame, area: Rect, theme: &Theme) {
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "  Payment successful!",
            Style::default().fg(theme.positive).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("  Taking you to app selection..."),
    ];
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border));
    f.render_widget(Paragraph::new(lines).block(block), area);
}

// ── Add sources ─────────────────────────────────────────────────────────────

fn draw_add_sources(f: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    match app.sources.verified {
        None => {
            let block = Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.border));
            f.render_widget(
                Paragraph::new("\n\nChecking payment status...")
                    .alignment(Alignment::Center)
                    .style(theme.muted_style())
                    .block(block),
                area,
            );
            return;
        }
        Some(false) => {
            let block = Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.border));
            f.render_widget(
                Paragraph::new("\n\nPayment verification failed. Redirecting to payment...")
                    .alignment(Alignment::Center)
                    .style(Style::default().fg(theme.negative))
                    .block(block),
                area,
            );
            return;
        }
        Some(true) => {}
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Search input
            Constraint::Length(3), // Current selections
            Constraint::Min(5),    // Results
        ])
        .split(area);

    // Search input
    let context_label = match app.sources.context {
        SelectionContext::MyApp => "selecting: my app",
        SelectionContext::Competitor => "selecting: competitor",
    };
    let searching = app.form_mode == FormMode::Search;
    let query_style = if searching {
        Style::default().bg(theme.selected_bg).fg(theme.selected_fg)
    } else {
        Style::default().fg(theme.fg)
    };
    let search_line = Line::from(vec![
        Span::styled("Search: ", theme.muted_style()),
        Span::styled(app.sources.query.clone(), query_style),
        Span::styled(if searching { "_" } else { "" }, query_style),
        Span::raw("   "),
        Span::styled(format!("[{}]", context_label), theme.badge_style()),
    ]);
    let search_block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(" App Search ", theme.title_style()))
        .border_style(Style::default().fg(theme.border));
    f.render_widget(Paragraph::new(search_line).block(search_block), chunks[0]);

    // Current selections
    let my_app = app
        .store
        .current_app()
        .map(|a| a.name)
        .unwrap_or_else(|| "none".to_string());
    let competitor = app
        .store
        .competitor()
        .map(|a| a.name)
        .unwrap_or_else(|| "none".to_string());
    let selections = Line::from(vec![
        Span::styled("My app: ", theme.muted_style()),
        Span::styled(my_app, Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("   "),
        Span::styled("Competitor: ", theme.muted_style()),
        Span::styled(competitor, Style::default().add_modifier(Modifier::BOLD)),
    ]);
    let selections_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border));
    f.render_widget(Paragraph::new(selections).block(selections_block), chunks[1]);

    // Results list
    let items: Vec<ListItem> = app
        .sources
        .results
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let style = if i == app.sources.selected {
                Style::default().bg(theme.selected_bg).fg(theme.selected_fg)
            } else {
                Style::default().fg(theme.fg)
            };
            ListItem::new(Line::from(vec![
                Span::raw(format!("{} ", entry.icon)),
                Span::styled(entry.name.clone(), style.add_modifier(Modifier::BOLD)),
                Span::styled(format!("  {}", entry.publisher), theme.muted_style()),
            ]))
            .style(style)
        })
        .collect();

    let hint = if app.sources.busy {
        " Results (working...) "
    } else {
        " Results - / search, c context, Enter select, x deselect "
    };
    let results_block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(hint, theme.title_style()))
        .border_style(Style::default().fg(theme.border));
    f.render_widget(List::new(items).block(results_block), chunks[2]);
}

// ── Dashboard ───────────────────────────────────────────────────────────────

fn draw_dashboard(f: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    let metrics = app.dashboard.data();

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Headline numbers + sentiment gauge
            Constraint::Length(9), // Ratings + monthly
            Constraint::Min(6),    // Reviews table + feature requests
        ])
        .split(area);

    // Headline: totals and average rating
    let headline = Line::from(vec![
        Span::styled("Total reviews: ", theme.muted_style()),
        Span::styled(
            format_count(metrics.total_reviews),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw("    "),
        Span::styled("Average rating: ", theme.muted_style()),
        Span::styled(
            format!("{:.1}/5 {}", metrics.average_rating, stars(metrics.average_rating)),
            Style::default().fg(theme.neutral).add_modifier(Modifier::BOLD),
        ),
    ]);
    let summary = Line::from(Span::styled(
        truncate(&metrics.summary, area.width.saturating_sub(4) as usize),
        theme.muted_style(),
    ));
    let head_block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(" App Summary ", theme.title_style()))
        .border_style(Style::default().fg(theme.border));
    f.render_widget(
        Paragraph::new(vec![headline, summary]).block(head_block),
        rows[0],
    );

    let mid = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[1]);

    // Rating distribution
    let rating_rows: Vec<Row> = metrics
        .ratings
        .iter()
        .map(|slice| {
            Row::new(vec![
                Cell::from(slice.label),
                Cell::from(format_count(slice.count)),
                Cell::from(format!("{:>5.1}%", slice.percent)),
                Cell::from(bar(slice.percent, 20)).style(Style::default().fg(theme.accent)),
            ])
        })
        .collect();
    let ratings_table = Table::new(
        rating_rows,
        [
            Constraint::Length(7),
            Constraint::Length(8),
            Constraint::Length(7),
            Constraint::Min(10),
        ],
    )
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(Span::styled(" Ratings ", theme.title_style()))
            .border_style(Style::default().fg(theme.border)),
    );
    f.render_widget(ratings_table, mid[0]);

    // Sentiment gauge + monthly volume
    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(3)])
        .split(mid[1]);

    let sentiment = &metrics.sentiment;
    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(Span::styled(" Sentiment (positive share) ", theme.title_style()))
                .border_style(Style::default().fg(theme.border)),
        )
        .gauge_style(Style::default().fg(theme.positive))
        .label(format!(
            "{:.0}% positive / {:.0}% neutral / {:.0}% negative",
            sentiment.positive, sentiment.neutral, sentiment.negative
        ))
        .ratio((sentiment.positive / 100.0).clamp(0.0, 1.0));
    f.render_widget(gauge, right[0]);

    let peak = metrics.monthly.iter().map(|m| m.reviews).max().unwrap_or(1);
    let monthly_lines: Vec<Line> = metrics
        .monthly
        .iter()
        .take(right[1].height.saturating_sub(2) as usize)
        .map(|m| {
            Line::from(vec![
                Span::styled(format!("{:<4}", m.month), theme.muted_style()),
                Span::styled(
                    bar(m.reviews as f64 / peak as f64 * 100.0, 18),
                    Style::default().fg(theme.accent),
                ),
                Span::raw(format!(" {}", format_count(m.reviews))),
            ])
        })
        .collect();
    let monthly_block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(" Monthly Reviews ", theme.title_style()))
        .border_style(Style::default().fg(theme.border));
    f.render_widget(Paragraph::new(monthly_lines).block(monthly_block), right[1]);

    // Reviews table + feature requests
    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(68), Constraint::Percentage(32)])
        .split(rows[2]);

    let review_rows: Vec<Row> = metrics
        .reviews
        .iter()
        .map(|review| {
            let sentiment_style = Style::default().fg(theme.sentiment_color(&review.sentiment));
            Row::new(vec![
                Cell::from(truncate(&review.author, 14)),
                Cell::from("★".repeat(review.rating as usize)),
                Cell::from(truncate(&review.text, 48)),
                Cell::from(review.sentiment.clone()).style(sentiment_style),
            ])
        })
        .collect();
    let reviews_table = Table::new(
        review_rows,
        [
            Constraint::Length(14),
            Constraint::Length(6),
            Constraint::Min(20),
            Constraint::Length(9),
        ],
    )
    .header(
        Row::new(vec!["User", "Rating", "Review", "Sentiment"]).style(theme.muted_style()),
    )
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(Span::styled(" Recent Reviews ", theme.title_style()))
            .border_style(Style::default().fg(theme.border)),
    );
    f.render_widget(reviews_table, bottom[0]);

    let request_items: Vec<ListItem> = metrics
        .feature_requests
        .iter()
        .map(|feature| {
            ListItem::new(Line::from(vec![
                Span::styled(feature.name.clone(), Style::default().add_modifier(Modifier::BOLD)),
                Span::styled(
                    format!("  {} requests", format_count(feature.count)),
                    theme.muted_style(),
                ),
            ]))
        })
        .collect();
    let requests_block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(" Top Feature Requests ", theme.title_style()))
        .border_style(Style::default().fg(theme.border));
    f.render_widget(List::new(request_items).block(requests_block), bottom[1]);
}

// ── Sentiment ───────────────────────────────────────────────────────────────

fn draw_sentiment(f: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    let metrics = app.sentiment.data();

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Length(9), Constraint::Min(5)])
        .split(area);

    let head = Line::from(vec![
        Span::styled("Total reviews analyzed: ", theme.muted_style()),
        Span::styled(
            format_count(metrics.total_reviews),
            Style::default().add_modifier(Modifier::BOLD),
        ),
    ]);
    f.render_widget(
        Paragraph::new(head).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.border)),
        ),
        rows[0],
    );

    // One gauge per class
    let class_rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
        ])
        .split(rows[1]);

    let classes = [
        ("Positive", &metrics.positive, theme.positive),
        ("Neutral", &metrics.neutral, theme.neutral),
        ("Negative", &metrics.negative, theme.negative),
    ];
    for ((name, stat, color), chunk) in classes.iter().zip(class_rows.iter()) {
        let gauge = Gauge::default()
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(Span::styled(format!(" {} ", name), theme.title_style()))
                    .border_style(Style::default().fg(theme.border)),
            )
            .gauge_style(Style::default().fg(*color))
            .label(format!(
                "{:.0}%  ({} reviews, avg rating {:.1})",
                stat.percent,
                format_count(stat.count),
                stat.average_rating
            ))
            .ratio((stat.percent / 100.0).clamp(0.0, 1.0));
        f.render_widget(gauge, *chunk);
    }

    // Word frequency columns
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(33),
            Constraint::Percentage(34),
            Constraint::Percentage(33),
        ])
        .split(rows[2]);

    let word_lists = [
        ("Positive words", &metrics.positive_words, theme.positive),
        ("Neutral words", &metrics.neutral_words, theme.neutral),
        ("Negative words", &metrics.negative_words, theme.negative),
    ];
    for ((title, words, color), chunk) in word_lists.iter().zip(columns.iter()) {
        let items: Vec<ListItem> = words
            .iter()
            .map(|tally| {
                ListItem::new(Line::from(vec![
                    Span::styled(format!("{:<14}", tally.word), Style::default().fg(*color)),
                    Span::styled(format_count(tally.count), theme.muted_style()),
                ]))
            })
            .collect();
        let block = Block::default()
            .borders(Borders::ALL)
            .title(Span::styled(format!(" {} ", title), theme.title_style()))
            .border_style(Style::default().fg(theme.border));
        f.render_widget(List::new(items).block(block), *chunk);
    }
}

// ── Features ────────────────────────────────────────────────────────────────

fn draw_features(f: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    let metrics = app.features.data();

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(9), Constraint::Min(6)])
        .split(area);

    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[0]);

    // Trending features
    let trending_rows: Vec<Row> = metrics
        .trending
        .iter()
        .map(|feature| {
            Row::new(vec![
                Cell::from(truncate(&feature.name, 18)),
                Cell::from(format_count(feature.count)),
                Cell::from(format!("+{:.1}%", feature.change))
                    .style(Style::default().fg(theme.positive)),
            ])
        })
        .collect();
    let trending_table = Table::new(
        trending_rows,
        [
            Constraint::Length(18),
            Constraint::Length(8),
            Constraint::Length(8),
        ],
    )
    .header(Row::new(vec!["Feature", "Mentions", "Change"]).style(theme.muted_style()))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(Span::styled(
                format!(" Trending ({} tracked) ", format_count(metrics.total_features)),
                theme.title_style(),
            ))
            .border_style(Style::default().fg(theme.border)),
    );
    f.render_widget(trending_table, top[0]);

    // Bug reports by month
    let bug_rows: Vec<Row> = metrics
        .bug_reports
        .iter()
        .map(|month| {
            Row::new(vec![
                Cell::from(month.month.clone()),
                Cell::from(format!("{}", month.crashes))
                    .style(Style::default().fg(theme.negative)),
                Cell::from(format!("{}", month.bugs)).style(Style::default().fg(theme.neutral)),
            ])
        })
        .collect();
    let bug_table = Table::new(
        bug_rows,
        [
            Constraint::Length(5),
            Constraint::Length(8),
            Constraint::Length(6),
        ],
    )
    .header(Row::new(vec!["Month", "Crashes", "Bugs"]).style(theme.muted_style()))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(Span::styled(" Bug Reports ", theme.title_style()))
            .border_style(Style::default().fg(theme.border)),
    );
    f.render_widget(bug_table, top[1]);

    // Feature requests with representative reviews, plus mention trends
    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(rows[1]);

    let request_items: Vec<ListItem> = metrics
        .requests
        .iter()
        .map(|request| {
            ListItem::new(vec![
                Line::from(vec![
                    Span::styled(
                        request.name.clone(),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(
                        format!("  {} votes", format_count(request.votes)),
                        theme.muted_style(),
                    ),
                ]),
                Line::from(Span::styled(
                    format!("  \"{}\"", truncate(&request.review, 60)),
                    theme.muted_style(),
                )),
            ])
        })
        .collect();
    let requests_block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(" Feature Requests ", theme.title_style()))
        .border_style(Style::default().fg(theme.border));
    f.render_widget(List::new(request_items).block(requests_block), bottom[0]);

    // Mention trends: latest month per tracked feature as a bar
    let last_month = metrics.trend_months.last().cloned().unwrap_or_default();
    let peak = metrics
        .trend_series
        .iter()
        .filter_map(|s| s.counts.last().copied())
        .max()
        .unwrap_or(1);
    let trend_lines: Vec<Line> = metrics
        .trend_series
        .iter()
        .map(|series| {
            let latest = series.counts.last().copied().unwrap_or(0);
            Line::from(vec![
                Span::styled(format!("{:<16}", truncate(&series.name, 16)), theme.muted_style()),
                Span::styled(
                    bar(latest as f64 / peak as f64 * 100.0, 14),
                    Style::default().fg(theme.accent),
                ),
                Span::raw(format!(" {}", format_count(latest))),
            ])
        })
        .collect();
    let trends_block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(
            format!(" Mentions in {} ", last_month),
            theme.title_style(),
        ))
        .border_style(Style::default().fg(theme.border));
    f.render_widget(Paragraph::new(trend_lines).block(trends_block), bottom[1]);
}

// ── Competitor ──────────────────────────────────────────────────────────────

fn draw_competitor(f: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    let view = &app.competitor;

    if !view.has_competitor() {
        let lines = vec![
            Line::from(""),
            Line::from("  No competitor selected yet."),
            Line::from(""),
            Line::from(vec![
                Span::raw("  Go to "),
                Span::styled("Add Sources", theme.title_style()),
                Span::raw(" (key 6), switch the context with "),
                Span::styled("c", theme.title_style()),
                Span::raw(", and pick a competitor app."),
            ]),
        ];
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.border));
        f.render_widget(Paragraph::new(lines).block(block), area);
        return;
    }

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(6)])
        .split(area);

    // Ratings head-to-head
    let ratings = vec![
        Line::from(vec![
            Span::styled(format!("{:<24}", view.my_app_name()), Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(format!("{:.1} ", view.my_rating), Style::default().fg(theme.positive)),
            Span::raw(stars(view.my_rating)),
        ]),
        Line::from(vec![
            Span::styled(format!("{:<24}", view.competitor_name()), Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(format!("{:.1} ", view.competitor_rating), Style::default().fg(theme.neutral)),
            Span::raw(stars(view.competitor_rating)),
        ]),
    ];
    let ratings_block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(" Rating Comparison ", theme.title_style()))
        .border_style(Style::default().fg(theme.border));
    f.render_widget(Paragraph::new(ratings).block(ratings_block), rows[0]);

    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[1]);

    // Feature parity matrix
    let check = |present: bool| if present { "✓" } else { "✗" };
    let matrix_rows: Vec<Row> = view
        .feature_matrix
        .iter()
        .map(|parity| {
            Row::new(vec![
                Cell::from(parity.feature.clone()),
                Cell::from(check(parity.my_app)).style(Style::default().fg(if parity.my_app {
                    theme.positive
                } else {
                    theme.muted
                })),
                Cell::from(check(parity.competitor)).style(Style::default().fg(
                    if parity.competitor {
                        theme.positive
                    } else {
                        theme.muted
                    },
                )),
            ])
        })
        .collect();
    let matrix_table = Table::new(
        matrix_rows,
        [
            Constraint::Min(16),
            Constraint::Length(8),
            Constraint::Length(12),
        ],
    )
    .header(Row::new(vec!["Feature", "My App", "Competitor"]).style(theme.muted_style()))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(Span::styled(" Feature Matrix ", theme.title_style()))
            .border_style(Style::default().fg(theme.border)),
    );
    f.render_widget(matrix_table, bottom[0]);

    // Monthly review volumes side by side
    let peak = view
        .monthly
        .iter()
        .map(|m| m.my_app.max(m.competitor))
        .max()
        .unwrap_or(1);
    let monthly_lines: Vec<Line> = view
        .monthly
        .iter()
        .map(|m| {
            Line::from(vec![
                Span::styled(format!("{:<4}", m.month), theme.muted_style()),
                Span::styled(
                    bar(m.my_app as f64 / peak as f64 * 100.0, 10),
                    Style::default().fg(theme.positive),
                ),
                Span::raw(" "),
                Span::styled(
                    bar(m.competitor as f64 / peak as f64 * 100.0, 10),
                    Style::default().fg(theme.neutral),
                ),
                Span::styled(
                    format!(" {} vs {}", format_count(m.my_app), format_count(m.competitor)),
                    theme.muted_style(),
                ),
            ])
        })
        .collect();
    let monthly_block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(" Monthly Reviews (mine vs theirs) ", theme.title_style()))
        .border_style(Style::default().fg(theme.border));
    f.render_widget(Paragraph::new(monthly_lines).block(monthly_block), bottom[1]);
}

// ── Chrome ──────────────────────────────────────────────────────────────────

fn draw_logs_panel(f: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    let entries = app.log_buffer.get_all();
    let visible = area.height.saturating_sub(2) as usize;
    let lines: Vec<Line> = entries
        .iter()
        .rev()
        .take(visible)
        .rev()
        .map(|entry| {
            let level_color = match entry.level {
                LogLevel::Error => theme.negative,
                LogLevel::Warn => theme.neutral,
                LogLevel::Info => theme.accent,
                LogLevel::Debug | LogLevel::Trace => theme.muted,
            };
            Line::from(vec![
                Span::styled(
                    format!("{} ", entry.timestamp.format("%H:%M:%S")),
                    theme.muted_style(),
                ),
                Span::styled(format!("{:<5} ", entry.level.as_str()), Style::default().fg(level_color)),
                Span::raw(truncate(&entry.message, area.width.saturating_sub(18) as usize)),
            ])
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(" System Logs ", theme.title_style()))
        .border_style(Style::default().fg(theme.border));
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_status(f: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    // Toast > banner > page error > key hints
    let (message, style) = if let Some(toast) = app.toast() {
        (toast.to_string(), Style::default().fg(theme.positive))
    } else if let Some(banner) = &app.banner {
        (banner.clone(), Style::default().fg(theme.negative))
    } else if let Some(error) = page_error(app) {
        (
            format!("Last fetch failed: {}", error),
            Style::default().fg(theme.negative),
        )
    } else {
        (
            "q quit - 1-7 pages - d dark mode - r refresh - o sign out".to_string(),
            theme.muted_style(),
        )
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border));
    f.render_widget(
        Paragraph::new(Line::from(Span::styled(message, style)))
            .wrap(Wrap { trim: true })
            .block(block),
        area,
    );
}

/// The active page's fetch error, if any
fn page_error(app: &App) -> Option<&str> {
    match app.route {
        Route::Dashboard => app.dashboard.error(),
        Route::SentimentAnalysis => app.sentiment.error(),
        Route::FeatureIdentification => app.features.error(),
        _ => None,
    }
}

// ── Small helpers ───────────────────────────────────────────────────────────

/// Thousands separators for counts
fn format_count(n: u64) -> String {
    let raw = n.to_string();
    let mut out = String::with_capacity(raw.len() + raw.len() / 3);
    for (i, c) in raw.chars().enumerate() {
        if i > 0 && (raw.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Horizontal bar scaled to a percentage of the given width
fn bar(percent: f64, width: usize) -> String {
    let filled = ((percent / 100.0).clamp(0.0, 1.0) * width as f64).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

/// Star string for a 0-5 rating
fn stars(rating: f64) -> String {
    let filled = rating.round().clamp(0.0, 5.0) as usize;
    format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled))
}

/// Truncate to a display width, honoring wide characters
fn truncate(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w + 1 > max_width {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_count_groups_thousands() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(7321), "7,321");
        assert_eq!(format_count(1234567), "1,234,567");
    }

    #[test]
    fn bar_scales_and_clamps() {
        assert_eq!(bar(0.0, 4), "░░░░");
        assert_eq!(bar(100.0, 4), "████");
        assert_eq!(bar(150.0, 4), "████");
        assert_eq!(bar(50.0, 4), "██░░");
    }

    #[test]
    fn stars_round_to_whole_stars() {
        assert_eq!(stars(4.2), "★★★★☆");
        assert_eq!(stars(0.0), "☆☆☆☆☆");
        assert_eq!(stars(6.0), "★★★★★");
    }

    #[test]
    fn truncate_respects_display_width() {
        assert_eq!(truncate("short", 10), "short");
        let cut = truncate("a long review text", 8);
        assert!(cut.ends_with('…'));
        assert!(cut.width() <= 8);
    }
}
