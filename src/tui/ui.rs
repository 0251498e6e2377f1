//! UI rendering for the front panel.

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, List, ListItem},
    style::{Color, Style, Modifier},
};
use crate::panel::{leds, SwitchBank};
use super::app::{PanelApp, Row};

/// Main draw function.
pub fn draw(frame: &mut Frame, app: &PanelApp) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(60),
            Constraint::Percentage(40),
        ])
        .split(frame.area());

    // Left side: lamps, switches, code and status
    let left_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7),
            Constraint::Length(4),
            Constraint::Min(6),
            Constraint::Length(3),
            Constraint::Length(4),
        ])
        .split(chunks[0]);

    draw_lamps(frame, left_chunks[0], app);
    draw_switches(frame, left_chunks[1], app);
    draw_disassembly(frame, left_chunks[2], app);
    draw_status(frame, left_chunks[3], app);
    draw_help(frame, left_chunks[4]);

    draw_tape(frame, chunks[1], app);
}

/// A row of lamps, lit for true.
fn lamp_spans(bits: &[bool]) -> Vec<Span<'static>> {
    bits.iter()
        .map(|&on| {
            if on {
                Span::styled("● ", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD))
            } else {
                Span::styled("○ ", Style::default().fg(Color::DarkGray))
            }
        })
        .collect()
}

/// A row of switches, with the cursor highlighted.
fn switch_spans(bank: &SwitchBank, cursor: Option<usize>) -> Vec<Span<'static>> {
    bank.switches()
        .iter()
        .enumerate()
        .map(|(i, &up)| {
            let glyph = if up { "▲ " } else { "▽ " };
            let style = if cursor == Some(i) {
                Style::default().fg(Color::Black).bg(Color::Yellow)
            } else {
                Style::default().fg(Color::White)
            };
            Span::styled(glyph, style)
        })
        .collect()
}

/// Draw flag and accumulator lamps.
fn draw_lamps(frame: &mut Frame, area: Rect, app: &PanelApp) {
    let flags = app.cpu.flags;
    let regs = app.cpu.regs;

    let mut flag_line = vec![Span::raw("OVER ")];
    flag_line.extend(lamp_spans(&[flags.overflow]));
    flag_line.push(Span::raw("  ZERO "));
    flag_line.extend(lamp_spans(&[flags.zero]));
    flag_line.push(Span::raw("  ERROR "));
    flag_line.extend(lamp_spans(&[flags.error]));

    let mut acc_line = vec![Span::raw("ACCUMULATOR ")];
    acc_line.extend(lamp_spans(&leds(regs.accumulator)));
    acc_line.push(Span::raw(format!(" = {:#04x} ({})", regs.accumulator, regs.accumulator)));

    let mut pc_line = vec![Span::raw("PROGRAM CTR ")];
    pc_line.extend(lamp_spans(&leds(regs.program_counter)));
    pc_line.push(Span::raw(format!(" = {:#04x}", regs.program_counter)));

    let state_style = if app.cpu.is_halted() {
        Style::default().fg(Color::Red)
    } else {
        Style::default().fg(Color::Green)
    };
    let in_flight = app.cpu.in_flight()
        .map(|i| format!("{} {:#04x} ({:?})", i.opcode(), i.operand(), i.step()))
        .unwrap_or_else(|| "-".into());

    let content = vec![
        Line::from(flag_line),
        Line::from(acc_line),
        Line::from(pc_line),
        Line::from(vec![
            Span::raw("State: "),
            Span::styled(format!("{:?}", app.cpu.state()), state_style),
            Span::raw("   Cycles: "),
            Span::styled(format!("{}", app.cpu.cycles), Style::default().fg(Color::Cyan)),
            Span::raw(format!("   In flight: {}", in_flight)),
        ]),
        Line::from(match app.cpu.fault() {
            Some(fault) => Span::styled(format!("Fault: {}", fault), Style::default().fg(Color::Red)),
            None => Span::raw(""),
        }),
    ];

    let paragraph = Paragraph::new(content)
        .block(Block::default()
            .title(" Computer ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green)));

    frame.render_widget(paragraph, area);
}

/// Draw the address and value switch banks.
fn draw_switches(frame: &mut Frame, area: Rect, app: &PanelApp) {
    let (row, column) = app.cursor;
    let cursor_on = |r: Row| (row == r).then_some(column);

    let mut address = vec![Span::raw("ADDRESS ")];
    address.extend(switch_spans(&app.panel.address, cursor_on(Row::Address)));
    address.push(Span::raw(format!(" {:#04x}", app.panel.address.read_byte())));

    let mut value = vec![Span::raw("VALUE   ")];
    value.extend(switch_spans(&app.panel.value, cursor_on(Row::Value)));
    value.push(Span::raw(format!(" {:#04x}", app.panel.value.read_byte())));

    let paragraph = Paragraph::new(vec![Line::from(address), Line::from(value)])
        .block(Block::default()
            .title(" Switches ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow)));

    frame.render_widget(paragraph, area);
}

/// Draw disassembly around the PC.
fn draw_disassembly(frame: &mut Frame, area: Rect, app: &PanelApp) {
    let disasm = app.get_disassembly((area.height as usize).saturating_sub(2));

    let items: Vec<ListItem> = disasm
        .iter()
        .map(|(addr, instr, is_current)| {
            let prefix = if *is_current { "▶ " } else { "  " };
            let style = if *is_current {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };

            ListItem::new(format!("{}{:02x}: {}", prefix, addr, instr)).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(Block::default()
            .title(" Disassembly ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)));

    frame.render_widget(list, area);
}

/// Draw the paper tape.
fn draw_tape(frame: &mut Frame, area: Rect, app: &PanelApp) {
    let (row, column) = app.cursor;

    let lines: Vec<Line> = app.panel.tape.rows()
        .iter()
        .enumerate()
        .map(|(i, bank)| {
            let cursor = (row == Row::Tape(i)).then_some(column);
            let mut spans = vec![Span::raw(format!("{:02x} ", i))];
            spans.extend(switch_spans(bank, cursor));
            spans.push(Span::styled(
                format!(" {:#04x}", bank.read_byte()),
                Style::default().fg(Color::DarkGray),
            ));
            Line::from(spans)
        })
        .collect();

    let paragraph = Paragraph::new(lines)
        .block(Block::default()
            .title(" Paper tape ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Magenta)));

    frame.render_widget(paragraph, area);
}

/// Draw status bar.
fn draw_status(frame: &mut Frame, area: Rect, app: &PanelApp) {
    let status = Paragraph::new(app.status.clone())
        .style(Style::default().fg(Color::White))
        .block(Block::default()
            .title(" Status ")
            .borders(Borders::ALL));

    frame.render_widget(status, area);
}

/// Draw help panel.
fn draw_help(frame: &mut Frame, area: Rect) {
    let help = Paragraph::new(vec![
        Line::from("←↑↓→: Move  Space: Toggle  Enter: Deposit  t: Load tape"),
        Line::from("r: Reset  h: Halt  p: Pause  s: Step  x: Reload  q: Quit"),
    ])
    .style(Style::default().fg(Color::DarkGray))
    .block(Block::default()
        .title(" Help ")
        .borders(Borders::ALL));

    frame.render_widget(help, area);
}
