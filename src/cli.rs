//! Command-line surface (spec.md §6).
//!
//! The option grammar is short-flag-only, with several flags changing
//! meaning when doubled (`-jj` vs `-j`, `-nn` vs `-n`, ...) and a handful of
//! options (`-c`/`-i`/`-u`/`-s`) that take a following argument whose shape
//! (static JSON / walk path / `-e`-prefixed shell expression) is decided by
//! the driver, not by `clap`. `clap`'s derive macros have no way to express
//! "count consecutive identical short flags" together with "split the
//! argument vector on a bare `/`", so parsing happens in two stages:
//! [`extract_mutators`] pulls the source-bearing options and `-e ... \;`
//! shell expressions out of the raw tokens by hand, and [`Args::parse_from`]
//! (via `clap::Parser`) takes what's left — every flag that's a plain bool
//! or a repeat count. This mirrors the option table in the program this was
//! distilled from, which hand-rolls exactly this split (a `-e` lookahead
//! that swallows tokens up to `\;` before its own getopt-style loop runs).

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum CliError {
    #[error("{0}")]
    Parse(String),
    #[error("missing '\\;' terminator for -e shell expression")]
    MissingShellTerminator,
    #[error("-e must be immediately followed by -i or -u")]
    ShellEvalWithoutMutator,
    #[error("option -{0} is transient and may only appear in the first or last option set")]
    MisplacedTransientOption(char),
    #[error("option -{0} requires an argument")]
    MissingArgument(char),
}

impl CliError {
    /// Exit code offset for this subsystem (spec.md §7 band 40-49).
    pub fn exit_code(&self) -> i32 {
        let slot = match self {
            CliError::Parse(_) => 0,
            CliError::MissingShellTerminator => 1,
            CliError::ShellEvalWithoutMutator => 2,
            CliError::MisplacedTransientOption(_) => 3,
            CliError::MissingArgument(_) => 4,
        };
        40 + slot
    }
}

/// A `-c`/`-i`/`-u`/`-s` occurrence, with its source argument and whether it
/// arrived via `-e` (making it a shell expression rather than a literal).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutatorArg {
    pub kind: MutatorKind,
    pub raw: String,
    pub shell: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutatorKind {
    Compare,
    Insert,
    Update,
    Swap,
}

/// Every flag that may appear only in the first or last option set
/// (spec.md §4.7 "transient options").
pub const TRANSIENT_FLAGS: &[char] = &['d', 't', 'r', 'q', 'z', 'f'];

/// Split raw argv (already stripped of argv[0]) into independent option
/// sets on bare `/` tokens (spec.md §4.7).
pub fn split_into_sets(argv: &[String]) -> Vec<Vec<String>> {
    let mut sets = vec![Vec::new()];
    for tok in argv {
        if tok == "/" {
            sets.push(Vec::new());
        } else {
            sets.last_mut().unwrap().push(tok.clone());
        }
    }
    sets
}

/// Pull every `-c`/`-i`/`-u`/`-s` occurrence (folding a preceding `-e ... \;`
/// into the one that follows it) out of `tokens`, returning the mutator list
/// plus whatever tokens remain for [`Args::parse_from`].
pub fn extract_mutators(tokens: &[String]) -> Result<(Vec<String>, Vec<MutatorArg>), CliError> {
    let mut remaining = Vec::new();
    let mut mutators = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        match tokens[i].as_str() {
            "-e" => {
                i += 1;
                let mut words = Vec::new();
                let mut terminated = false;
                while i < tokens.len() {
                    if tokens[i] == "\\;" {
                        terminated = true;
                        i += 1;
                        break;
                    }
                    words.push(tokens[i].clone());
                    i += 1;
                }
                if !terminated {
                    return Err(CliError::MissingShellTerminator);
                }
                let kind = match tokens.get(i).map(String::as_str) {
                    Some("-i") => MutatorKind::Insert,
                    Some("-u") => MutatorKind::Update,
                    _ => return Err(CliError::ShellEvalWithoutMutator),
                };
                i += 1;
                mutators.push(MutatorArg { kind, raw: words.join(" "), shell: true });
            }
            "-c" | "-i" | "-u" | "-s" => {
                let flag = tokens[i].chars().nth(1).unwrap();
                let kind = match flag {
                    'c' => MutatorKind::Compare,
                    'i' => MutatorKind::Insert,
                    'u' => MutatorKind::Update,
                    's' => MutatorKind::Swap,
                    _ => unreachable!(),
                };
                i += 1;
                let raw = tokens.get(i).ok_or(CliError::MissingArgument(flag))?.clone();
                i += 1;
                mutators.push(MutatorArg { kind, raw, shell: false });
            }
            other => {
                remaining.push(other.to_string());
                i += 1;
            }
        }
    }
    Ok((remaining, mutators))
}

/// Parse an `-x` argument as the `N[/M]` every-Nth-walk display selector;
/// anything else is a common path part (spec.md §6).
fn parse_every_nth(s: &str) -> Option<(usize, usize)> {
    let mut parts = s.splitn(2, '/');
    let n: usize = parts.next()?.parse().ok()?;
    if n == 0 {
        return None;
    }
    let m: usize = match parts.next() {
        Some(m) => m.parse().ok()?,
        None => 0,
    };
    Some((n, m))
}

/// Pull `-x`/`-y` out of `tokens` by hand (spec.md §6). `clap::ArgAction::Append`
/// would collect every `-x` occurrence and every `-y` occurrence into two
/// separate lists, losing which `-y`s followed which `-x` on the command
/// line; `-x`'s argument is either a common path part (prepended to every
/// following `-y`, up to the next `-x`) or, when it parses as `N[/M]`, the
/// every-Nth-walk display selector. A common part with no `-y` after it
/// becomes a standalone walk of its own.
pub fn extract_walk_parts(
    tokens: &[String],
) -> Result<(Vec<String>, Vec<String>, Option<(usize, usize)>), CliError> {
    let mut remaining = Vec::new();
    let mut assembled = Vec::new();
    let mut common: Option<String> = None;
    let mut common_used = false;
    let mut every_nth = None;
    let mut i = 0;
    while i < tokens.len() {
        match tokens[i].as_str() {
            "-x" => {
                i += 1;
                let arg = tokens.get(i).ok_or(CliError::MissingArgument('x'))?.clone();
                i += 1;
                if let Some(sel) = parse_every_nth(&arg) {
                    every_nth = Some(sel);
                } else {
                    if let Some(c) = common.take() {
                        if !common_used {
                            assembled.push(c);
                        }
                    }
                    common = Some(arg);
                    common_used = false;
                }
            }
            "-y" => {
                i += 1;
                let arg = tokens.get(i).ok_or(CliError::MissingArgument('y'))?.clone();
                i += 1;
                let mut full = common.clone().unwrap_or_default();
                full.push_str(&arg);
                assembled.push(full);
                common_used = true;
            }
            other => {
                remaining.push(other.to_string());
                i += 1;
            }
        }
    }
    if let Some(c) = common.take() {
        if !common_used {
            assembled.push(c);
        }
    }
    Ok((remaining, assembled, every_nth))
}

/// The simple (non-source-bearing) part of one option set's flags, parsed
/// with `clap`'s derive after [`extract_mutators`] has stripped everything
/// it can't express.
#[derive(clap::Parser, Debug, Clone, Default)]
#[command(name = "jsonwalk", no_binary_name = true)]
pub struct Args {
    /// `-a`: process every concatenated JSON value in the input, not just
    /// the first.
    #[arg(short = 'a')]
    pub all: bool,

    /// `-d`: raise debug verbosity; repeatable.
    #[arg(short = 'd', action = clap::ArgAction::Count)]
    pub debug: u8,

    /// `-f`: write the result back into the input file instead of stdout.
    #[arg(short = 'f')]
    pub force_write: bool,

    /// `-g`: print the walk-path mini user guide and exit.
    #[arg(short = 'g')]
    pub guide: bool,

    /// `-w`: a standalone walk path; repeatable.
    #[arg(short = 'w', action = clap::ArgAction::Append)]
    pub walk: Vec<String>,

    /// `-T`: a template to interpolate before an insert/update is applied.
    #[arg(short = 'T', action = clap::ArgAction::Append)]
    pub template: Vec<String>,

    /// `-j`/`-jj`: wrap walked matches into an array, or (doubled) an
    /// object keyed by their labels.
    #[arg(short = 'j', action = clap::ArgAction::Count)]
    pub jsonize: u8,

    /// `-J`: wrap every processed input's result into one array.
    #[arg(short = 'J')]
    pub jsonize_all: bool,

    /// `-l`/`-ll`: print a walked match's label, or (doubled) glean labels
    /// from within a matched container too.
    #[arg(short = 'l', action = clap::ArgAction::Count)]
    pub labels: u8,

    /// `-m`: toggle merge mode for `-i`/`-u`.
    #[arg(short = 'm')]
    pub merge: bool,

    /// `-n`/`-nn`: disable interleaving (concatenate walks in argument
    /// order); doubled additionally suppresses output grouping.
    #[arg(short = 'n', action = clap::ArgAction::Count)]
    pub sequential: u8,

    /// `-p`/`-pp`: purge walked matches, or (doubled) invert the purge to
    /// keep only their ancestor/descendant spine.
    #[arg(short = 'p', action = clap::ArgAction::Count)]
    pub purge: u8,

    /// `-q`/`-qq`: enforce strict solidus parsing, or (doubled) unquote a
    /// string result.
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quote_solidus: u8,

    /// `-r`/`-rr`: print raw (one-line) JSON, or (doubled) stringify the
    /// whole result.
    #[arg(short = 'r', action = clap::ArgAction::Count)]
    pub raw: u8,

    /// `-t`: indent width for pretty printing; an optional trailing `c`
    /// requests semi-compact mode.
    #[arg(short = 't')]
    pub indent: Option<String>,

    /// `-z`/`-zz`: append the result's node count to the output, or
    /// (doubled) print only the size.
    #[arg(short = 'z', action = clap::ArgAction::Count)]
    pub size: u8,

    /// Input files; `-` forces reading from stdin.
    pub files: Vec<String>,

    /// Walk strings assembled from `-x`/`-y` by [`extract_walk_parts`], in
    /// the order they were assembled. Not parsed by `clap`: `-x`/`-y` never
    /// reach it, since [`extract_walk_parts`] strips them from the token
    /// stream first.
    #[arg(skip)]
    pub extra_walks: Vec<String>,

    /// `-x N[/M]`: display only every `N`-th compiled walk, starting at
    /// offset `M`.
    #[arg(skip)]
    pub every_nth: Option<(usize, usize)>,
}

impl Args {
    pub fn parse_from_tokens(tokens: &[String]) -> Result<Self, CliError> {
        <Self as clap::Parser>::try_parse_from(tokens).map_err(|e| CliError::Parse(e.to_string()))
    }
}

/// Is this set the first, the last, both (a single-set invocation), or
/// neither?
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetPosition {
    First,
    Last,
    Both,
    Middle,
}

pub fn set_position(index: usize, total: usize) -> SetPosition {
    match (index == 0, index + 1 == total) {
        (true, true) => SetPosition::Both,
        (true, false) => SetPosition::First,
        (false, true) => SetPosition::Last,
        (false, false) => SetPosition::Middle,
    }
}

/// Reject a transient flag's use outside the first/last set (spec.md §4.7).
pub fn check_transient_placement(args: &Args, pos: SetPosition) -> Result<(), CliError> {
    if pos == SetPosition::First || pos == SetPosition::Last || pos == SetPosition::Both {
        return Ok(());
    }
    if args.debug > 0 {
        return Err(CliError::MisplacedTransientOption('d'));
    }
    if args.indent.is_some() {
        return Err(CliError::MisplacedTransientOption('t'));
    }
    if args.raw > 0 {
        return Err(CliError::MisplacedTransientOption('r'));
    }
    if args.quote_solidus > 0 {
        return Err(CliError::MisplacedTransientOption('q'));
    }
    if args.size > 0 {
        return Err(CliError::MisplacedTransientOption('z'));
    }
    if args.force_write {
        return Err(CliError::MisplacedTransientOption('f'));
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn splits_on_bare_slash() {
        let argv = vec!["-w".into(), "[a]".into(), "/".into(), "-u".into(), "1".into()];
        let sets = split_into_sets(&argv);
        assert_eq!(sets.len(), 2);
        assert_eq!(sets[0], vec!["-w", "[a]"]);
        assert_eq!(sets[1], vec!["-u", "1"]);
    }

    #[test]
    fn extracts_plain_mutator() {
        let argv = vec!["-u".into(), "7".into(), "-w".into(), "[a]".into()];
        let (rest, mutators) = extract_mutators(&argv).unwrap();
        assert_eq!(rest, vec!["-w", "[a]"]);
        assert_eq!(mutators.len(), 1);
        assert_eq!(mutators[0].kind, MutatorKind::Update);
        assert_eq!(mutators[0].raw, "7");
        assert!(!mutators[0].shell);
    }

    #[test]
    fn folds_shell_eval_into_following_mutator() {
        let argv = vec!["-e".into(), "echo".into(), "hi".into(), "\\;".into(), "-i".into(), "[a]".into()];
        let (rest, mutators) = extract_mutators(&argv).unwrap();
        assert_eq!(rest, vec!["[a]"]);
        assert_eq!(mutators.len(), 1);
        assert!(mutators[0].shell);
        assert_eq!(mutators[0].kind, MutatorKind::Insert);
        assert_eq!(mutators[0].raw, "echo hi");
    }

    #[test]
    fn missing_semicolon_terminator_errors() {
        let argv = vec!["-e".into(), "echo".into(), "hi".into(), "-i".into(), "[a]".into()];
        assert!(matches!(extract_mutators(&argv), Err(CliError::MissingShellTerminator)));
    }

    #[test]
    fn doubled_flag_counts_occurrences() {
        let args = Args::parse_from_tokens(&["-j".into(), "-j".into()]).unwrap();
        assert_eq!(args.jsonize, 2);
    }

    #[test]
    fn assembles_common_path_with_each_partial() {
        let argv = vec!["-x".into(), "[a]".into(), "-y".into(), "[b]".into(), "-y".into(), "[c]".into()];
        let (rest, walks, every_nth) = extract_walk_parts(&argv).unwrap();
        assert!(rest.is_empty());
        assert_eq!(walks, vec!["[a][b]", "[a][c]"]);
        assert_eq!(every_nth, None);
    }

    #[test]
    fn lone_common_part_becomes_its_own_walk() {
        let argv = vec!["-x".into(), "[a]".into()];
        let (_, walks, _) = extract_walk_parts(&argv).unwrap();
        assert_eq!(walks, vec!["[a]"]);
    }

    #[test]
    fn numeric_x_argument_is_every_nth_selector_not_a_common_part() {
        let argv = vec!["-x".into(), "2/1".into()];
        let (_, walks, every_nth) = extract_walk_parts(&argv).unwrap();
        assert!(walks.is_empty());
        assert_eq!(every_nth, Some((2, 1)));
    }

    #[test]
    fn transient_flag_rejected_mid_chain() {
        let mut args = Args::default();
        args.debug = 1;
        assert!(check_transient_placement(&args, SetPosition::Middle).is_err());
        assert!(check_transient_placement(&args, SetPosition::First).is_ok());
    }
}
