// src/display/terminal.rs
//! Terminal front end for the location reading and the composed map

use crate::{
    error::{GeoError, Result},
    location::{LocationProvider, LocationReading},
    map::{ComposedModule, MapView, RenderNode},
};
use crossterm::{
    cursor::{Hide, MoveTo, Show},
    execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{Clear, ClearType, DisableLineWrap, EnableLineWrap},
};
use std::{
    io::{self, Write},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::time::sleep;

pub struct TerminalDisplay {
    refresh: Duration,
}

impl TerminalDisplay {
    pub fn new() -> Self {
        Self {
            refresh: Duration::from_secs(1),
        }
    }

    /// Redraw until `running` clears or Ctrl+C is pressed
    pub async fn run(
        &self,
        location: &LocationProvider,
        view: &MapView,
        running: Arc<AtomicBool>,
    ) -> Result<()> {
        let mut stdout = io::stdout();
        execute!(stdout, Hide, DisableLineWrap)?;

        let running_clone = Arc::clone(&running);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                running_clone.store(false, Ordering::Relaxed);
            }
        });

        while running.load(Ordering::Relaxed) {
            execute!(stdout, Clear(ClearType::All), MoveTo(0, 0))?;

            let reading = location.current_reading();
            let modules = view.render();
            render_frame(&mut stdout, &reading, view, &modules)?;

            stdout.flush()?;
            sleep(self.refresh).await;
        }

        execute!(stdout, Show, EnableLineWrap)?;
        println!("\nShutting down...");
        Ok(())
    }
}

impl Default for TerminalDisplay {
    fn default() -> Self {
        Self::new()
    }
}

fn section(stdout: &mut impl Write, color: Color, title: &str) -> Result<()> {
    execute!(
        stdout,
        SetForegroundColor(color),
        Print(format!("{}:\n", title)),
        ResetColor
    )
    .map_err(GeoError::Io)
}

/// Render one frame: reading, viewport, then modules in stacking order
pub fn render_frame(
    stdout: &mut impl Write,
    reading: &LocationReading,
    view: &MapView,
    modules: &[ComposedModule],
) -> Result<()> {
    execute!(
        stdout,
        SetForegroundColor(Color::Green),
        Print("=".repeat(60)),
        Print("\ngeomap - location and map modules\n"),
        Print("=".repeat(60)),
        Print("\n"),
        ResetColor
    )?;

    section(stdout, Color::Yellow, "LOCATION")?;
    let updated = match reading.updated_at {
        Some(ts) => ts.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => "No data received".to_string(),
    };
    execute!(
        stdout,
        Print(format!("  Latitude:  {}\n", LocationReading::format_coordinate(reading.latitude()))),
        Print(format!("  Longitude: {}\n", LocationReading::format_coordinate(reading.longitude()))),
        Print(format!("  Precision: {:>12}\n", reading.precision)),
        Print(format!("  Updated:   {}\n", updated))
    )?;
    if let Some(error) = &reading.error {
        execute!(
            stdout,
            SetForegroundColor(Color::Red),
            Print(format!("  Error:     {}\n", error)),
            ResetColor
        )?;
    }
    execute!(stdout, Print("\n"))?;

    section(stdout, Color::Cyan, "VIEWPORT")?;
    let initial = view.initial_view_state();
    execute!(
        stdout,
        Print(format!("  Center:    {:.6}, {:.6}\n", initial.latitude, initial.longitude)),
        Print(format!("  Zoom:      {:>12}\n", initial.zoom)),
        Print(format!("  Pitch:     {:>12}\n", initial.pitch)),
        Print(format!("  Ready:     {:>12}\n\n", view.map_ref().is_ready()))
    )?;

    section(stdout, Color::Magenta, "MODULES")?;
    if modules.is_empty() {
        execute!(stdout, Print("  (none)\n"))?;
    }
    for module in modules {
        execute!(stdout, Print(format!("  [{}]\n", module.key)))?;
        render_node(stdout, &module.node, 2)?;
    }

    execute!(
        stdout,
        SetForegroundColor(Color::Green),
        Print("\n"),
        Print("=".repeat(60)),
        Print("\nPress Ctrl+C to exit\n"),
        ResetColor
    )?;

    Ok(())
}

fn render_node(stdout: &mut impl Write, node: &RenderNode, depth: usize) -> Result<()> {
    let indent = "  ".repeat(depth);
    match node {
        RenderNode::Empty => {}
        RenderNode::Text(text) => execute!(stdout, Print(format!("{}{}\n", indent, text)))?,
        RenderNode::Marker {
            latitude,
            longitude,
            label,
        } => execute!(
            stdout,
            Print(format!(
                "{}@ {:.6}, {:.6} {}\n",
                indent,
                latitude,
                longitude,
                label.as_deref().unwrap_or("")
            ))
        )?,
        RenderNode::Group(children) => {
            for child in children {
                render_node(stdout, child, depth)?;
            }
        }
    }
    Ok(())
}
