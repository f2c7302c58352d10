use crate::core::config::Config;
use anyhow::{anyhow, bail, Context, Result};
use inquire::{CustomType, Text};

const DEFAULT_NUM_SCENES: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    pub book_title: String,
    pub num_scenes: usize,
}

impl RunRequest {
    pub fn new(book_title: &str, num_scenes: usize) -> Result<Self> {
        let book_title = book_title.trim();
        if book_title.is_empty() {
            bail!("Book title must not be empty");
        }
        if num_scenes == 0 {
            bail!("Number of scenes must be a positive integer");
        }
        Ok(Self {
            book_title: book_title.to_string(),
            num_scenes,
        })
    }
}

/// `[BOOK_TITLE] [NUM_SCENES]`. Returns `None` when no arguments were given.
pub fn parse_args<I>(args: I) -> Result<Option<RunRequest>>
where
    I: IntoIterator<Item = String>,
{
    let args: Vec<String> = args.into_iter().collect();
    match args.as_slice() {
        [] => Ok(None),
        [title, count] => {
            let num_scenes = count.trim().parse::<usize>().map_err(|_| {
                anyhow!("Number of scenes must be a positive integer, got '{}'", count)
            })?;
            RunRequest::new(title, num_scenes).map(Some)
        }
        _ => bail!("Usage: book2video [BOOK_TITLE] [NUM_SCENES]"),
    }
}

/// Takes the request from the command line, or asks for it interactively.
pub fn collect_request<I>(config: &Config, args: I) -> Result<RunRequest>
where
    I: IntoIterator<Item = String>,
{
    if let Some(request) = parse_args(args)? {
        return Ok(request);
    }

    if config.unattended {
        bail!("Running unattended: pass BOOK_TITLE and NUM_SCENES on the command line");
    }

    let book_title = Text::new("Book title:")
        .prompt()
        .context("Failed to read book title")?;
    let num_scenes = CustomType::<usize>::new("Number of scenes:")
        .with_default(DEFAULT_NUM_SCENES)
        .with_error_message("Please type a positive whole number")
        .prompt()
        .context("Failed to read number of scenes")?;

    RunRequest::new(&book_title, num_scenes)
}
