use crate::styles;
use anyhow::Result;
use fedinbox_client::{InboxView, Notice, NoticeKind, PostCard};
use ratatui::{
    Terminal,
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use textwrap::wrap;

/// Everything one frame needs, copied out of the loop's state.
pub struct ViewSnap {
    pub view: InboxView,
    pub selected: usize,
    pub loaded: bool,
    pub busy: bool,
    pub spinner: &'static str,
    pub notice: Option<Notice>,
}

pub fn draw<B: Backend>(term: &mut Terminal<B>, snap: &ViewSnap) -> Result<()> {
    term.draw(|frame| {
        let area = frame.area();

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(3),
                Constraint::Length(3),
            ])
            .split(area);

        let count = snap.view.cards().len();
        let header = Paragraph::new(Line::from(vec![
            Span::styled(" Fedinbox ", styles::header()),
            Span::styled(format!("• {count} post(s)"), styles::dim()),
        ]));
        frame.render_widget(header, layout[0]);

        let block = Block::default().borders(Borders::ALL).title(" Inbox ");
        let inner_w = layout[1].width.saturating_sub(2) as usize;
        let visible_h = layout[1].height.saturating_sub(2) as usize;
        match &snap.view {
            InboxView::Empty { message } => {
                let text = if snap.loaded { *message } else { "Loading…" };
                let body = Paragraph::new(Line::from(Span::styled(text, styles::dim())))
                    .alignment(Alignment::Center)
                    .block(block);
                frame.render_widget(body, layout[1]);
            }
            InboxView::Posts { cards } => {
                let (lines, spans) = card_lines(cards, snap.selected, inner_w);
                let offset = scroll_offset(&spans, snap.selected, visible_h);
                let body = Paragraph::new(lines)
                    .block(block)
                    .scroll((offset as u16, 0));
                frame.render_widget(body, layout[1]);
            }
        }

        let status = Paragraph::new(status_line(snap))
            .block(Block::default().borders(Borders::ALL).title(" Status "));
        frame.render_widget(status, layout[2]);

        if let Some(notice) = &snap.notice {
            draw_notice(frame, area, notice);
        }
    })?;

    Ok(())
}

fn status_line(snap: &ViewSnap) -> Line<'static> {
    let mut spans = vec![
        Span::raw(" "),
        Span::styled(snap.spinner, styles::warning()),
        Span::raw(" "),
        if snap.busy {
            Span::styled("Working…", styles::warning())
        } else {
            Span::styled("Idle", styles::info())
        },
    ];
    let hints = if snap.view.has_archive_all() {
        " • ↑/↓ select • Enter expand • a archive • A archive all • f favorite • s share • r refresh • q quit"
    } else {
        " • r refresh • q quit"
    };
    spans.push(Span::styled(hints, styles::dim()));
    Line::from(spans)
}

fn draw_notice(frame: &mut ratatui::Frame<'_>, area: Rect, notice: &Notice) {
    let (title, style) = match notice.kind {
        NoticeKind::Info => (" Notice ", styles::info()),
        NoticeKind::Error => (" Error ", styles::error()),
    };
    let width = (area.width * 3 / 5).max(20).min(area.width);
    let text_w = width.saturating_sub(2).max(1) as usize;
    let body_h = wrap(&notice.message, text_w).len() as u16;
    let height = (body_h + 4).min(area.height);
    let rect = Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    };

    let lines = vec![
        Line::from(Span::styled(notice.message.clone(), style)),
        Line::raw(""),
        Line::from(Span::styled("Enter/Esc to dismiss", styles::dim())),
    ];
    let popup = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(Clear, rect);
    frame.render_widget(popup, rect);
}

/// Lines for all cards, plus each card's `(first_line, line_count)`.
fn card_lines(
    cards: &[PostCard],
    selected: usize,
    width: usize,
) -> (Vec<Line<'static>>, Vec<(usize, usize)>) {
    let width = width.max(1);
    let mut out = Vec::new();
    let mut spans = Vec::with_capacity(cards.len());

    for (idx, card) in cards.iter().enumerate() {
        let start = out.len();
        let is_selected = idx == selected;
        let marker = if is_selected { "▶ " } else { "  " };
        let author_style = if is_selected {
            styles::selected_author()
        } else {
            styles::author()
        };
        out.push(Line::from(vec![
            Span::raw(marker),
            Span::styled(card.author.clone(), author_style),
        ]));

        if let Some(warning) = &card.content_warning {
            let toggle = card.toggle_label.unwrap_or_default();
            push_wrapped(&mut out, &format!("⚠ {warning} [{toggle}]"), width, styles::warning());
        }
        if card.content_visible {
            push_wrapped(&mut out, &card.body, width, styles::body());
        }
        push_wrapped(&mut out, &card.url, width, styles::link());

        let favorite = if card.favorite_pending {
            format!("[f] {}…", card.favorite_label)
        } else {
            format!("[f] {}", card.favorite_label)
        };
        let favorite_style = if card.favorited {
            styles::favorited()
        } else {
            styles::control()
        };
        out.push(Line::from(vec![
            Span::styled("  [a] Archive  [s] Share  ", styles::control()),
            Span::styled(favorite, favorite_style),
        ]));
        out.push(Line::raw(""));
        spans.push((start, out.len() - start));
    }

    (out, spans)
}

fn push_wrapped(out: &mut Vec<Line<'static>>, text: &str, width: usize, style: Style) {
    let inner = width.saturating_sub(2).max(1);
    for raw_line in text.split('\n') {
        if raw_line.is_empty() {
            out.push(Line::raw(""));
            continue;
        }
        for seg in wrap(raw_line, inner) {
            out.push(Line::from(vec![
                Span::raw("  "),
                Span::styled(seg.into_owned(), style),
            ]));
        }
    }
}

/// First line to show so the selected card is fully on screen when it fits.
fn scroll_offset(spans: &[(usize, usize)], selected: usize, visible_h: usize) -> usize {
    let Some(&(start, len)) = spans.get(selected) else {
        return 0;
    };
    let end = start + len;
    if len > visible_h {
        start
    } else {
        end.saturating_sub(visible_h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;

    fn card(id: &str) -> PostCard {
        PostCard {
            id: id.into(),
            author: "Alice".into(),
            content_warning: None,
            content_visible: true,
            toggle_label: None,
            body: format!("body {id}"),
            url: format!("https://bzh.social/@alice/{id}"),
            favorited: false,
            favorite_label: "Favorite",
            favorite_pending: false,
        }
    }

    fn screen(snap: &ViewSnap) -> String {
        let mut term = Terminal::new(TestBackend::new(100, 30)).unwrap();
        draw(&mut term, snap).unwrap();
        term.backend()
            .buffer()
            .content
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    fn snap(view: InboxView) -> ViewSnap {
        ViewSnap {
            view,
            selected: 0,
            loaded: true,
            busy: false,
            spinner: " ",
            notice: None,
        }
    }

    #[test]
    fn empty_view_shows_placeholder_only() {
        let text = screen(&snap(InboxView::Empty {
            message: "No new posts available.",
        }));
        assert!(text.contains("No new posts available."));
        assert!(!text.contains("Archive"));
        assert!(!text.contains("Favorite"));
    }

    #[test]
    fn cards_show_controls_and_labels() {
        let mut second = card("2");
        second.favorited = true;
        second.favorite_label = "Unfavorite";
        let text = screen(&snap(InboxView::Posts {
            cards: vec![card("1"), second],
        }));
        assert!(text.contains("body 1"));
        assert!(text.contains("[a] Archive"));
        assert!(text.contains("[f] Unfavorite"));
        assert!(text.contains("A archive all"));
    }

    #[test]
    fn hidden_body_is_not_drawn() {
        let mut warned = card("1");
        warned.content_warning = Some("Content Warning: film".into());
        warned.content_visible = false;
        warned.toggle_label = Some("Show More");
        let text = screen(&snap(InboxView::Posts { cards: vec![warned] }));
        assert!(text.contains("Content Warning: film [Show More]"));
        assert!(!text.contains("body 1"));
    }

    #[test]
    fn notice_is_drawn_on_top() {
        let mut s = snap(InboxView::Empty {
            message: "No new posts available.",
        });
        s.notice = Some(Notice::info("Post shared successfully!"));
        let text = screen(&s);
        assert!(text.contains("Post shared successfully!"));
        assert!(text.contains("Enter/Esc to dismiss"));
    }

    #[test]
    fn scroll_keeps_selected_card_visible() {
        let spans = [(0, 5), (5, 5), (10, 5)];
        assert_eq!(scroll_offset(&spans, 0, 8), 0);
        assert_eq!(scroll_offset(&spans, 2, 8), 7);
        // taller than the window: pin its first line
        assert_eq!(scroll_offset(&spans, 1, 3), 5);
    }
}
