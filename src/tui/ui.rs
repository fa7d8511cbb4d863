//! UI rendering for the debugger.

use ratatui::{
    prelude::*,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, List, ListItem, Paragraph},
};

use super::app::DebuggerApp;
use crate::cpu::memory::MEMORY_SIZE;
use crate::report::format_word;

/// Main draw function.
pub fn draw(frame: &mut Frame, app: &DebuggerApp) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(frame.area());

    // Left side: code and status
    let left_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(10),
            Constraint::Length(8),
            Constraint::Length(3),
        ])
        .split(chunks[0]);

    draw_disassembly(frame, left_chunks[0], app);
    draw_registers(frame, left_chunks[1], app);
    draw_status(frame, left_chunks[2], app);

    // Right side: memory, outputs, help
    let right_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(10),
            Constraint::Length(8),
            Constraint::Length(4),
        ])
        .split(chunks[1]);

    draw_memory(frame, right_chunks[0], app);
    draw_outputs(frame, right_chunks[1], app);
    draw_help(frame, right_chunks[2]);
}

/// Draw disassembly view centered on the counter.
fn draw_disassembly(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let listing = app.get_disassembly((area.height as usize).saturating_sub(2));

    let items: Vec<ListItem> = listing
        .iter()
        .map(|(addr, instr, is_current)| {
            let prefix = if *is_current { "> " } else { "  " };
            let bp = if app.breakpoints.contains(addr) { "*" } else { " " };
            let text = format!("{}{}{:02}: {}", bp, prefix, addr, instr);

            let style = if *is_current {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else if app.breakpoints.contains(addr) {
                Style::default().fg(Color::Red)
            } else {
                Style::default()
            };

            ListItem::new(text).style(style)
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .title(" Disassembly ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    frame.render_widget(list, area);
}

/// Draw register state.
fn draw_registers(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let regs = &app.machine.regs;

    let content = vec![
        Line::from(vec![
            Span::raw("accumulator:          "),
            Span::styled(format_word(regs.accumulator), Style::default().fg(Color::White)),
        ]),
        Line::from(vec![
            Span::raw("instruction counter:  "),
            Span::styled(format!("{:02}", regs.counter), Style::default().fg(Color::Yellow)),
        ]),
        Line::from(vec![
            Span::raw("instruction register: "),
            Span::styled(
                format_word(regs.instruction_register),
                Style::default().fg(Color::White),
            ),
            Span::raw(format!(
                "   op: {:02}   operand: {:02}",
                regs.operation_code, regs.operand
            )),
        ]),
        Line::from(vec![
            Span::raw("cycles: "),
            Span::styled(format!("{}", app.machine.cycles), Style::default().fg(Color::Cyan)),
            Span::raw("   inputs left: "),
            Span::styled(
                format!("{}", app.machine.remaining_inputs()),
                Style::default().fg(Color::Cyan),
            ),
            Span::raw("   state: "),
            Span::styled(
                format!("{:?}", app.machine.state),
                if app.machine.is_running() {
                    Style::default().fg(Color::Green)
                } else {
                    Style::default().fg(Color::Red)
                },
            ),
        ]),
    ];

    let paragraph = Paragraph::new(content).block(
        Block::default()
            .title(" Registers ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green)),
    );

    frame.render_widget(paragraph, area);
}

/// Draw memory view.
fn draw_memory(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let visible_rows = (area.height as usize).saturating_sub(2);
    let start = app.mem_scroll;
    let end = (start + visible_rows).min(MEMORY_SIZE);

    let items: Vec<ListItem> = (start..end)
        .map(|addr| {
            let value = app.machine.mem.read(addr);
            let is_pc = addr == app.machine.regs.counter;

            let text = format!("{:02}: {} ({})", addr, format_word(value), value);

            let style = if is_pc {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else if value != 0 {
                Style::default().fg(Color::White)
            } else {
                Style::default().fg(Color::DarkGray)
            };

            ListItem::new(text).style(style)
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .title(" Memory ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Magenta)),
    );

    frame.render_widget(list, area);
}

/// Draw status bar.
fn draw_status(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let status = Paragraph::new(app.status.clone())
        .style(Style::default().fg(Color::White))
        .block(Block::default().title(" Status ").borders(Borders::ALL));

    frame.render_widget(status, area);
}

/// Draw captured write output.
fn draw_outputs(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let visible = (area.height as usize).saturating_sub(2);
    let records = &app.outputs.records;
    let start = records.len().saturating_sub(visible);

    let items: Vec<ListItem> = records[start..]
        .iter()
        .map(|(addr, value)| {
            ListItem::new(format!("{:02} : {}", addr, format_word(*value)))
                .style(Style::default().fg(Color::White))
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .title(" Output ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Blue)),
    );

    frame.render_widget(list, area);
}

/// Draw help panel.
fn draw_help(frame: &mut Frame, area: Rect) {
    let help = Paragraph::new(vec![
        Line::from("s: Step  r: Run  p: Pause  b: Breakpoint"),
        Line::from("x: Reset  Up/Down: Scroll memory  q: Quit"),
    ])
    .style(Style::default().fg(Color::DarkGray))
    .block(Block::default().title(" Help ").borders(Borders::ALL));

    frame.render_widget(help, area);
}
