use std::io::Read;
use std::path::PathBuf;
use std::time::SystemTime;

use clap::Parser;

use lesson_notes_pdf::{
    Error, FontSource, LayoutConfig, NoteOptions, generate_notes, notes_file_name, plan_notes,
};

#[derive(Parser)]
#[command(name = "lesson-notes-pdf")]
#[command(version)]
#[command(about = "Lay out generated lesson notes as a paginated PDF", long_about = None)]
struct Cli {
    /// Lesson text file (reads stdin when omitted or "-")
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Topic, drawn as the document title
    #[arg(short, long)]
    topic: String,

    /// Subject, stored in the PDF metadata
    #[arg(short, long, default_value = "")]
    subject: String,

    /// Output PDF path
    #[arg(short, long, value_name = "FILE", conflicts_with = "out_dir")]
    output: Option<PathBuf>,

    /// Directory for a timestamped "<companion>-<millis>.pdf"
    #[arg(long, value_name = "DIR")]
    out_dir: Option<PathBuf>,

    /// Companion name used in the generated file name
    #[arg(long, default_value = "notes")]
    companion: String,

    /// Font family looked up in system font directories and LESSON_NOTES_FONTS (default: DejaVu Sans)
    #[arg(long, conflicts_with_all = ["font", "bold_font", "builtin_fonts"])]
    font_family: Option<String>,

    /// Use unembedded Helvetica (WinAnsi characters only)
    #[arg(long, conflicts_with_all = ["font", "bold_font"])]
    builtin_fonts: bool,

    /// Regular TrueType/OpenType font file
    #[arg(long, value_name = "FILE", requires = "bold_font")]
    font: Option<PathBuf>,

    /// Bold TrueType/OpenType font file
    #[arg(long, value_name = "FILE", requires = "font")]
    bold_font: Option<PathBuf>,

    /// Page width in points
    #[arg(long)]
    page_width: Option<f32>,

    /// Page height in points
    #[arg(long)]
    page_height: Option<f32>,

    /// Margin on all sides in points
    #[arg(long)]
    margin: Option<f32>,

    /// Print the laid-out pages as JSON instead of writing a PDF
    #[arg(long)]
    dump_layout: bool,
}

impl Cli {
    fn options(&self) -> NoteOptions {
        let fonts = match (&self.font_family, &self.font, &self.bold_font) {
            (Some(family), _, _) => FontSource::Family(family.clone()),
            (None, Some(regular), Some(bold)) => FontSource::Files {
                regular: regular.clone(),
                bold: bold.clone(),
            },
            _ if self.builtin_fonts => FontSource::Builtin,
            _ => FontSource::default(),
        };
        let mut layout = LayoutConfig::default();
        if let Some(w) = self.page_width {
            layout.page_width = w;
        }
        if let Some(h) = self.page_height {
            layout.page_height = h;
        }
        if let Some(m) = self.margin {
            layout.margin = m;
        }
        NoteOptions { fonts, layout }
    }

    fn read_input(&self) -> Result<String, Error> {
        match &self.input {
            Some(path) if path.as_os_str() != "-" => Ok(std::fs::read_to_string(path)?),
            _ => {
                let mut text = String::new();
                std::io::stdin().read_to_string(&mut text)?;
                Ok(text)
            }
        }
    }

    fn output_path(&self) -> PathBuf {
        if let Some(path) = &self.output {
            return path.clone();
        }
        let name = notes_file_name(&self.companion, SystemTime::now());
        match &self.out_dir {
            Some(dir) => dir.join(name),
            None => PathBuf::from(name),
        }
    }
}

fn run(cli: &Cli) -> Result<(), Error> {
    let text = cli.read_input()?;
    let options = cli.options();

    if cli.dump_layout {
        let doc = plan_notes(&cli.topic, &cli.subject, &text, &options)?;
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }

    let notes = generate_notes(&cli.topic, &cli.subject, &text, &options)?;
    let output = cli.output_path();
    std::fs::write(&output, &notes.pdf)?;
    println!(
        "{} ({} pages, {} bytes)",
        output.display(),
        notes.document.pages.len(),
        notes.pdf.len()
    );
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
