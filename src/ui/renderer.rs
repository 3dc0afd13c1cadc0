use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::core::records::LearningRecord;
use crate::core::tutor::{NoticeKind, QuizState, Stage, Tutor};
use crate::ui::markdown::render_markdown;
use crate::ui::screen::TutorScreen;

const RECENT_RECORDS: usize = 3;
const TOPIC_WIDTH: usize = 32;

const STAGES: [(Stage, &str); 4] = [
    (Stage::Input, "Topic"),
    (Stage::Explanation, "Explanation"),
    (Stage::Quiz, "Quiz"),
    (Stage::Complete, "Complete"),
];

pub fn ui(f: &mut Frame, screen: &TutorScreen) {
    let tutor = &screen.tutor;
    let input_height = if screen.input_visible() { 3 } else { 0 };
    let status_height = u16::from(tutor.is_loading() || tutor.notice().is_some());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(status_height),
            Constraint::Length(input_height),
            Constraint::Length(1),
        ])
        .split(f.area());

    f.render_widget(Paragraph::new(title_line(tutor)), chunks[0]);

    let body = Paragraph::new(content_lines(tutor))
        .block(Block::default().borders(Borders::TOP | Borders::BOTTOM))
        .wrap(Wrap { trim: false })
        .scroll((screen.scroll, 0));
    f.render_widget(body, chunks[1]);

    if status_height > 0 {
        f.render_widget(
            Paragraph::new(status_line(screen)).wrap(Wrap { trim: true }),
            chunks[2],
        );
    }

    if input_height > 0 {
        f.render_widget(&screen.input, chunks[3]);
    }

    f.render_widget(
        Paragraph::new(Line::from(Span::styled(
            help_text(tutor),
            Style::default().fg(Color::DarkGray),
        ))),
        chunks[4],
    );
}

fn title_line(tutor: &Tutor) -> Line<'static> {
    let mut spans = vec![Span::styled(
        format!("Concept Mentor · {} ", tutor.settings().model),
        Style::default().add_modifier(Modifier::BOLD),
    )];
    for (index, (stage, label)) in STAGES.iter().enumerate() {
        let style = if *stage == tutor.stage() {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::raw(" "));
        spans.push(Span::styled(format!(" {}. {label} ", index + 1), style));
    }
    Line::from(spans)
}

/// Body text for the current stage.
pub(crate) fn content_lines(tutor: &Tutor) -> Vec<Line<'static>> {
    match tutor.stage() {
        Stage::Input => input_lines(tutor),
        Stage::Explanation => explanation_lines(tutor),
        Stage::Quiz => match tutor.quiz() {
            Some(quiz) => quiz_lines(quiz),
            None => Vec::new(),
        },
        Stage::Complete => complete_lines(tutor),
    }
}

fn heading(text: impl Into<String>) -> Line<'static> {
    Line::from(Span::styled(
        text.into(),
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    ))
}

fn input_lines(tutor: &Tutor) -> Vec<Line<'static>> {
    let mut lines = vec![
        heading("🧠 What would you like to learn today?"),
        Line::default(),
        Line::from("Type any concept below and press Enter. You will get a short explanation,"),
        Line::from("then two questions to check your understanding."),
    ];
    lines.extend(recent_records_lines(tutor.records().recent(RECENT_RECORDS)));
    lines
}

fn explanation_lines(tutor: &Tutor) -> Vec<Line<'static>> {
    let mut lines = vec![heading(format!("📚 {}", tutor.topic().trim())), Line::default()];
    lines.extend(render_markdown(tutor.explanation()));
    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        "Ready? Press Enter to start the quiz.",
        Style::default().fg(Color::Green),
    )));
    lines
}

fn quiz_lines(quiz: &QuizState) -> Vec<Line<'static>> {
    let question = quiz.current();
    let mut lines = vec![
        Line::from(Span::styled(
            format!(
                "Question {} of {} · {}",
                quiz.current_index() + 1,
                quiz.questions().len(),
                question.kind.label()
            ),
            Style::default().fg(Color::DarkGray),
        )),
        Line::default(),
        Line::from(Span::styled(
            question.question.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::default(),
    ];

    for (index, option) in question.options.iter().enumerate() {
        let selected = quiz.selected_option() == Some(index);
        let (marker, style) = if selected {
            ("●", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        } else {
            ("○", Style::default())
        };
        lines.push(Line::from(Span::styled(
            format!("  {marker} {}. {option}", index + 1),
            style,
        )));
    }

    if let Some(verdict) = quiz.verdict() {
        if !question.is_multiple_choice() {
            lines.push(Line::from(format!("Your answer: {}", quiz.typed_answer())));
        }
        lines.push(Line::default());
        lines.push(if verdict.is_correct {
            Line::from(Span::styled(
                "✅ Correct!",
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            ))
        } else {
            Line::from(Span::styled(
                "❌ Not quite.",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ))
        });
        lines.extend(verdict.feedback.lines().map(|line| Line::from(line.to_string())));
        lines.push(Line::from(Span::styled(
            format!("Reference answer: {}", question.correct_answer),
            Style::default().fg(Color::DarkGray),
        )));
    }
    lines
}

fn complete_lines(tutor: &Tutor) -> Vec<Line<'static>> {
    let score = tutor.last_score().unwrap_or(0);
    let mut lines = vec![
        heading("🎉 Quiz complete!"),
        Line::default(),
        Line::from(format!("Topic: {}", tutor.topic().trim())),
        Line::from(Span::styled(
            format!("Score: {score}/100"),
            Style::default().fg(score_color(score)).add_modifier(Modifier::BOLD),
        )),
    ];
    if let Some(quiz) = tutor.quiz() {
        lines.push(Line::from(format!(
            "{} of {} answers judged correct",
            quiz.correct_count(),
            quiz.questions().len()
        )));
    }
    lines.extend(recent_records_lines(tutor.records().recent(RECENT_RECORDS)));
    lines
}

fn recent_records_lines(records: &[LearningRecord]) -> Vec<Line<'static>> {
    if records.is_empty() {
        return Vec::new();
    }
    let mut lines = vec![Line::default(), heading("Recent learning")];
    for record in records.iter().rev() {
        lines.push(Line::from(vec![
            Span::styled(
                record.timestamp.format("%H:%M ").to_string(),
                Style::default().fg(Color::DarkGray),
            ),
            Span::raw(pad_to_width(&truncate_to_width(&record.topic, TOPIC_WIDTH), TOPIC_WIDTH)),
            Span::styled(
                format!(" {:>3}/100", record.score),
                Style::default().fg(score_color(record.score)),
            ),
        ]));
    }
    lines
}

fn score_color(score: u8) -> Color {
    match score {
        80..=100 => Color::Green,
        50..=79 => Color::Yellow,
        _ => Color::Red,
    }
}

const PULSE: [&str; 3] = ["○", "◐", "●"];

fn status_line(screen: &TutorScreen) -> Line<'static> {
    let tutor = &screen.tutor;
    if let Some(purpose) = tutor.pending_purpose() {
        let symbol = PULSE[screen.spinner_frame % PULSE.len()];
        return Line::from(Span::styled(
            format!("{symbol} {}", purpose.loading_label()),
            Style::default().fg(Color::Cyan),
        ));
    }

    let Some(notice) = tutor.notice() else {
        return Line::default();
    };
    let color = match notice.kind {
        NoticeKind::Info => Color::Green,
        NoticeKind::Validation => Color::Yellow,
        NoticeKind::Error => Color::Red,
    };
    let mut spans = vec![Span::styled(
        notice.title.clone(),
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    )];
    if let Some(detail) = &notice.detail {
        spans.push(Span::raw(format!(": {detail}")));
    }
    spans.push(Span::styled(
        "  (Esc to dismiss)",
        Style::default().fg(Color::DarkGray),
    ));
    Line::from(spans)
}

fn help_text(tutor: &Tutor) -> &'static str {
    match tutor.stage() {
        Stage::Input => "Enter: explain  Ctrl+S: change model  Ctrl+C: quit",
        Stage::Explanation => "Enter: start quiz  ↑/↓ PgUp/PgDn: scroll  Ctrl+R: start over  Ctrl+C: quit",
        Stage::Quiz => match tutor.quiz() {
            Some(quiz) if quiz.verdict().is_some() => {
                "Enter: next  ↑/↓: scroll  Ctrl+R: start over  Ctrl+C: quit"
            }
            Some(quiz) if quiz.current().is_multiple_choice() => {
                "1-9 or ↑/↓: choose  Enter: submit  Ctrl+R: start over  Ctrl+C: quit"
            }
            _ => "Enter: submit answer  Ctrl+R: start over  Ctrl+C: quit",
        },
        Stage::Complete => "Enter: learn something new  Ctrl+S: change model  Ctrl+C: quit",
    }
}

/// Cut `text` to at most `max` display columns, ending in `…` when cut.
pub(crate) fn truncate_to_width(text: &str, max: usize) -> String {
    if text.width() <= max {
        return text.to_string();
    }
    let mut out = String::new();
    let mut width = 0;
    for c in text.chars() {
        let char_width = c.width().unwrap_or(0);
        if width + char_width + 1 > max {
            break;
        }
        out.push(c);
        width += char_width;
    }
    out.push('…');
    out
}

fn pad_to_width(text: &str, width: usize) -> String {
    let padding = width.saturating_sub(text.width());
    format!("{text}{}", " ".repeat(padding))
}
