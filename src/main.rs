use albite::{
    book::Book,
    cli::Cli,
    config::Config,
    logging::{self, LogLevel},
    parser::{MarkupParser, PlainTextParser, TextParser, TokenKind, Tokenizer},
};

use clap::Parser;
use eyre::{Result, WrapErr};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::from_file(path)
            .wrap_err_with(|| format!("Could not load configuration {}", path.display()))?,
        None => match Config::new() {
            Ok(config) => config,
            Err(err) => {
                eprintln!("Warning: Could not load configuration: {}", err);
                eprintln!("Starting with default settings");
                Config::default()
            }
        },
    };
    logging::init(LogLevel::from_verbosity(config.log_level, cli.verbose, cli.debug));

    let mut book = Book::open_with_config(&cli.book, &config)
        .wrap_err_with(|| format!("Could not open {}", cli.book.display()))?;

    if let Some(index) = cli.goto {
        book.set_current_chapter(index);
        book.save_user_data()
            .wrap_err("Could not save reading progress")?;
    }

    if cli.toc {
        print_toc(&book);
    } else if let Some(index) = cli.dump {
        let index = book.chapter(index).index();
        println!("{}", book.chapter_text(index)?);
    } else if let Some(index) = cli.tokens {
        let index = book.chapter(index).index();
        let text = book.chapter_text(index)?;
        if cli.markup {
            print_tokens(MarkupParser::new(), text);
        } else {
            print_tokens(PlainTextParser, text);
        }
    } else {
        print_summary(&book);
    }

    book.close();
    Ok(())
}

fn print_summary(book: &Book) {
    let current = book.current_chapter();
    println!("Title: {}", book.title());
    println!("Author: {}", book.author());
    println!("Language: {}", book.language().name());
    println!("Chapters: {}", book.chapter_count());
    println!("Current chapter: {} ({})", current.index(), current.title());
    println!("Bookmarks: {}", book.bookmarks().len());
}

fn print_toc(book: &Book) {
    let current = book.current_chapter_number();
    for chapter in book.chapters() {
        let marker = if chapter.index() == current { '*' } else { ' ' };
        println!(
            "{}{:>4}  {}  [{}]",
            marker,
            chapter.index(),
            chapter.title(),
            chapter.source()
        );
    }
}

fn print_tokens<P: TextParser>(parser: P, text: &str) {
    let mut tokenizer = Tokenizer::new(parser);
    for token in tokenizer.tokens(text) {
        let kind = match token.kind {
            TokenKind::Pass => "pass".to_string(),
            TokenKind::Normal => "normal".to_string(),
            TokenKind::NewParagraph => "paragraph".to_string(),
            TokenKind::StyleChange => format!("style {:?} {:?}", token.style, token.align),
            TokenKind::Image { source, caption } => format!(
                "image src={:?} caption={:?}",
                source.slice(text),
                caption.slice(text)
            ),
            TokenKind::Ruler => "ruler".to_string(),
            TokenKind::Separator => "separator".to_string(),
        };
        println!(
            "{:>8} {:>6}  {}  {:?}",
            token.offset(),
            token.len(),
            kind,
            token.text(text)
        );
    }
}
