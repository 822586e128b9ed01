use color_eyre::Result;
use log::LevelFilter;
use ratatui::style::{Color, Style, Stylize};
use ratatui::widgets::{Block, Borders};
use tui_logger::{TuiLoggerLevelOutput, TuiLoggerWidget};

/// Route `log` records into tui-logger.
pub fn setup_logging() -> Result<()> {
    tui_logger::init_logger(LevelFilter::Trace)?;
    tui_logger::set_default_level(LevelFilter::Info);

    log::info!("Logger ready");
    Ok(())
}

/// Log pane shown next to the ring
pub fn create_log_widget<'a>() -> TuiLoggerWidget<'a> {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White))
        .title("Narration");

    TuiLoggerWidget::default()
        .block(block)
        .output_separator(' ')
        .output_timestamp(Some("%H:%M:%S%.3f".to_string()))
        .output_level(Some(TuiLoggerLevelOutput::Abbreviated))
        .output_target(false)
        .output_file(false)
        .output_line(false)
        .style_error(Style::default().fg(Color::Red).bold())
        .style_warn(Style::default().fg(Color::Yellow))
        .style_info(Style::default().fg(Color::Cyan))
        .style_debug(Style::default().fg(Color::DarkGray))
        .style_trace(Style::default().fg(Color::Gray))
}
