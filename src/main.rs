use std::path::PathBuf;

use clap::Parser;
use panel_optimizer::catalog::Catalog;
use panel_optimizer::config::load_catalog;
use panel_optimizer::request::{BoardSelection, CuttingRequest, Options, SupplyMode};
use panel_optimizer::types::{CutOrientation, Edging, PanelRequest, StockSheet};
use panel_optimizer::{CuttingResult, Limits, MAX_SHEET_QUANTITY, optimize, render};
use tracing::Level;

#[derive(Parser)]
#[command(
    name = "panel_optimizer",
    about = "Board cutting layout and quote calculator"
)]
struct Cli {
    /// Panels as WxL:qty[:edges] with edges from TRBL (e.g. 400x600:5 500x700:2:TRBL)
    #[arg(long, num_args = 1.., required_unless_present = "request")]
    panels: Vec<String>,

    /// Stock sheets as LxW[:qty] (default: the catalog board, unlimited)
    #[arg(long, num_args = 1..)]
    stock: Vec<String>,

    /// Blade kerf width in mm (default: catalog kerf)
    #[arg(long)]
    kerf: Option<u32>,

    /// Board as core:thickness:company:color
    #[arg(long, default_value = "plywood:18:Timsales:TS-101", value_parser = parse_board)]
    board: BoardSelection,

    /// Client supplies this many boards
    #[arg(long)]
    client_boards: Option<u32>,

    /// Meters of edging the client supplies
    #[arg(long, requires = "client_boards")]
    client_edging: Option<f64>,

    /// Do not price edge banding
    #[arg(long)]
    no_edging: bool,

    /// Use one sheet size for every board
    #[arg(long)]
    single_sheet: bool,

    /// Keep every panel in its requested grain direction
    #[arg(long)]
    grain: bool,

    /// Disable piece rotation
    #[arg(long)]
    no_rotate: bool,

    /// Read the whole request from a JSON file instead of the flags above
    #[arg(long)]
    request: Option<PathBuf>,

    /// Price catalog JSON (default: built-in price list)
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Show ASCII layout of each board
    #[arg(long)]
    layout: bool,

    /// Print the cut sequence of each board
    #[arg(long)]
    cut_list: bool,

    /// Print the full result as JSON
    #[arg(long)]
    json: bool,

    /// Log packing decisions to stderr
    #[arg(long)]
    verbose: bool,
}

fn parse_board(s: &str) -> Result<BoardSelection, String> {
    let parts: Vec<&str> = s.split(':').collect();
    let [core, thickness, company, color] = parts.as_slice() else {
        return Err(format!(
            "invalid board '{s}', expected core:thickness:company:color"
        ));
    };
    let thickness = thickness
        .trim_end_matches("mm")
        .parse::<u32>()
        .map_err(|_| format!("invalid thickness in '{s}'"))?;
    Ok(BoardSelection::new(*core, thickness, *company, *color))
}

fn parse_dimensions(s: &str) -> Result<(u32, u32), String> {
    let Some((a, b)) = s.split_once('x') else {
        return Err(format!("invalid dimensions '{s}', expected AxB"));
    };
    let a = a
        .parse::<u32>()
        .map_err(|_| format!("invalid first dimension in '{s}'"))?;
    let b = b
        .parse::<u32>()
        .map_err(|_| format!("invalid second dimension in '{s}'"))?;
    if a == 0 || b == 0 {
        return Err(format!("dimensions must be non-zero in '{s}'"));
    }
    Ok((a, b))
}

fn parse_edges(s: &str) -> Result<Edging, String> {
    let mut edging = Edging::default();
    for ch in s.chars() {
        match ch.to_ascii_uppercase() {
            'T' => edging.top = true,
            'R' => edging.right = true,
            'B' => edging.bottom = true,
            'L' => edging.left = true,
            _ => return Err(format!("invalid edge '{ch}', expected letters from TRBL")),
        }
    }
    Ok(edging)
}

fn parse_panel(s: &str) -> Result<PanelRequest, String> {
    let parts: Vec<&str> = s.split(':').collect();
    if !(2..=3).contains(&parts.len()) {
        return Err(format!("invalid panel '{s}', expected WxL:qty[:edges]"));
    }
    let (width, length) = parse_dimensions(parts[0])?;
    let qty = parts[1]
        .parse::<u32>()
        .map_err(|_| format!("invalid quantity in '{s}'"))?;
    if qty == 0 {
        return Err(format!("quantity must be non-zero in '{s}'"));
    }
    let edging = match parts.get(2) {
        Some(edges) => parse_edges(edges)?,
        None => Edging::default(),
    };
    Ok(PanelRequest::new(width, length, qty).with_edging(edging))
}

fn parse_stock(s: &str) -> Result<StockSheet, String> {
    let (dims, qty) = match s.split_once(':') {
        Some((dims, qty)) => (
            dims,
            qty.parse::<u32>()
                .map_err(|_| format!("invalid quantity in '{s}'"))?,
        ),
        None => (s, MAX_SHEET_QUANTITY),
    };
    let (length, width) = parse_dimensions(dims)?;
    Ok(StockSheet::new(length, width, qty))
}

fn build_request(cli: &Cli) -> Result<CuttingRequest, String> {
    if let Some(path) = &cli.request {
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
        return serde_json::from_str(&text)
            .map_err(|e| format!("invalid request {}: {e}", path.display()));
    }

    let panels = cli
        .panels
        .iter()
        .map(|p| parse_panel(p))
        .collect::<Result<Vec<_>, _>>()?;
    let stock = cli
        .stock
        .iter()
        .map(|s| parse_stock(s))
        .collect::<Result<Vec<_>, _>>()?;

    let supply = match cli.client_boards {
        Some(qty) => SupplyMode {
            client_edging_meters: cli.client_edging,
            ..SupplyMode::client(qty)
        },
        None => SupplyMode::factory(),
    };

    Ok(CuttingRequest {
        supply,
        stock_sheets: (!stock.is_empty()).then_some(stock),
        options: Options {
            kerf: cli.kerf,
            edge_banding: !cli.no_edging,
            use_single_sheet: cli.single_sheet,
            consider_grain: cli.grain,
            allow_rotation: !cli.no_rotate,
            ..Options::default()
        },
        ..CuttingRequest::new(panels, cli.board.clone())
    })
}

fn print_result(cli: &Cli, request: &CuttingRequest, result: &CuttingResult) {
    for layout in &result.layouts {
        let board = &layout.board;
        println!(
            "Board {} ({}x{} mm, {:.1}% used):",
            board.index + 1,
            board.width,
            board.height,
            layout.metrics.efficiency_percent
        );
        for p in &board.placements {
            let label = request
                .panels
                .get(p.panel_index)
                .map(|panel| panel.display_label(p.panel_index))
                .unwrap_or_default();
            let rot = if p.rotated { " [rotated]" } else { "" };
            println!("  {label}: {}x{} @ ({}, {}){rot}", p.width, p.height, p.x, p.y);
        }
        if cli.layout {
            print!("{}", render::render_board(board));
        }
        if cli.cut_list {
            println!("  Cuts:");
            for cut in &layout.cuts {
                let dir = match cut.orientation {
                    CutOrientation::Horizontal => "H",
                    CutOrientation::Vertical => "V",
                };
                println!(
                    "    #{} {dir} ({}, {}) -> ({}, {}) {} mm",
                    cut.id, cut.x1, cut.y1, cut.x2, cut.y2, cut.length
                );
            }
        }
        println!();
    }

    let summary = &result.summary;
    println!(
        "Summary: {} board{} used, {} pieces, {:.1}% waste, {:.2} m edging",
        summary.total_boards,
        if summary.total_boards == 1 { "" } else { "s" },
        summary.total_pieces,
        summary.waste_percent,
        summary.total_edging_meters,
    );

    let pricing = &result.pricing;
    for line in &pricing.lines {
        println!(
            "  {:<14} {:>8.2} {:<6} x {:>10.2} = {:>12.2}",
            line.item, line.quantity, line.unit, line.unit_price, line.amount
        );
    }
    println!("  {:<14} {:>47.2}", "Subtotal", pricing.subtotal);
    println!(
        "  {:<14} {:>47.2}",
        format!("{} {}%", pricing.tax_name, pricing.tax_rate),
        pricing.tax_amount
    );
    println!("  {:<14} {:>43.2} {}", "Total", pricing.total, pricing.currency);
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .init();

    let catalog = match &cli.catalog {
        Some(path) => load_catalog(path.clone()).unwrap_or_else(|e| {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }),
        None => Catalog::default(),
    };

    let request = build_request(&cli).unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(1);
    });

    let result = optimize(&request, &catalog, &Limits::default()).unwrap_or_else(|e| {
        eprintln!("Error [{}]: {e}", e.kind());
        std::process::exit(1);
    });

    if cli.json {
        match serde_json::to_string_pretty(&result) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    print_result(&cli, &request, &result);
}
