use super::lex::{Token, tokenize};
use crate::sched::Which;
use chumsky::error::RichReason;
use chumsky::extra;
use chumsky::prelude::{Parser, Rich, any, choice, end, just};

//===========================================================================//

type PError<'a> = extra::Err<Rich<'a, Token>>;

const DEFAULT_DISASM_COUNT: u32 = 8;

//===========================================================================//

/// One debugger script command.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Command {
    /// Steps one processor, or whichever is due first, `count` times.
    Step {
        /// The processor to step, or none to let the scheduler choose.
        which: Option<Which>,
        /// How many steps to take.
        count: u32,
    },
    /// Runs both processors for up to `count` steps, stopping early at a
    /// breakpoint.
    Run {
        /// The maximum number of steps to take.
        count: u32,
    },
    /// Stops execution once the cell at `address` has been applied `count`
    /// times.
    Break {
        /// The bus the address is on.
        which: Which,
        /// The address to watch.
        address: u32,
        /// The application count to stop at.
        count: u32,
    },
    /// Overwrites a register.
    Set {
        /// The processor whose register is set.
        which: Which,
        /// The single-letter register name.
        register: char,
        /// The new value.
        value: u32,
    },
    /// Writes one byte to a bus.
    Write {
        /// The bus to write to.
        which: Which,
        /// The address to write.
        address: u32,
        /// The byte to write.
        value: u8,
    },
    /// Prints the registers of both processors.
    Regs,
    /// Disassembles `count` instructions from the program counter.
    Disasm {
        /// The processor to disassemble for.
        which: Which,
        /// How many instructions to print.
        count: u32,
    },
}

impl Command {
    /// Parses one line of a debugger script.  Returns `None` for blank and
    /// comment-only lines.
    pub fn parse_line(line: &str) -> Result<Option<Command>, String> {
        let tokens = tokenize(line)?;
        if tokens.is_empty() {
            return Ok(None);
        }
        Command::parser()
            .then_ignore(end())
            .parse(tokens.as_slice())
            .into_result()
            .map(Some)
            .map_err(|errors| match errors.first() {
                Some(error) => describe(error),
                None => "invalid command".to_string(),
            })
    }

    fn parser<'a>() -> impl Parser<'a, &'a [Token], Command, PError<'a>> {
        let step = keyword("step")
            .ignore_then(processor().or_not())
            .then(number().or_not())
            .map(|(which, count)| Command::Step {
                which,
                count: count.unwrap_or(1),
            });
        let run = keyword("run")
            .ignore_then(number())
            .map(|count| Command::Run { count });
        let brk = keyword("break")
            .ignore_then(processor())
            .then(number())
            .then(number().or_not())
            .map(|((which, address), count)| Command::Break {
                which,
                address,
                count: count.unwrap_or(1),
            });
        let set = keyword("set")
            .ignore_then(processor())
            .then(register())
            .then_ignore(just(Token::Equals))
            .then(number())
            .map(|((which, register), value)| Command::Set {
                which,
                register,
                value,
            });
        let write = keyword("write")
            .ignore_then(processor())
            .then(number())
            .then_ignore(just(Token::Equals))
            .then(byte())
            .map(|((which, address), value)| Command::Write {
                which,
                address,
                value,
            });
        let regs = keyword("regs").to(Command::Regs);
        let disasm = keyword("disasm")
            .ignore_then(processor())
            .then(number().or_not())
            .map(|(which, count)| Command::Disasm {
                which,
                count: count.unwrap_or(DEFAULT_DISASM_COUNT),
            });
        choice((step, run, brk, set, write, regs, disasm))
    }
}

//===========================================================================//

fn describe(error: &Rich<Token>) -> String {
    match error.reason() {
        RichReason::Custom(message) => message.to_string(),
        _ => match error.found() {
            Some(token) => format!("unexpected {token}"),
            None => "unexpected end of line".to_string(),
        },
    }
}

fn keyword<'a>(
    word: &'static str,
) -> impl Parser<'a, &'a [Token], (), PError<'a>> + Clone {
    any()
        .filter(move |token: &Token| match token {
            Token::Word(id) => id.eq_ignore_ascii_case(word),
            _ => false,
        })
        .ignored()
        .labelled(word)
}

fn processor<'a>()
-> impl Parser<'a, &'a [Token], Which, PError<'a>> + Clone {
    choice((
        keyword("cpu").to(Which::Cpu),
        keyword("spc").to(Which::Spc),
    ))
}

fn number<'a>() -> impl Parser<'a, &'a [Token], u32, PError<'a>> + Clone {
    any().try_map(|token: Token, span| {
        token.hex_value().ok_or_else(|| {
            Rich::custom(span, format!("expected a hex number, found {token}"))
        })
    })
}

fn byte<'a>() -> impl Parser<'a, &'a [Token], u8, PError<'a>> + Clone {
    number().try_map(|value, span| {
        u8::try_from(value).map_err(|_| {
            Rich::custom(span, format!("${value:x} does not fit in a byte"))
        })
    })
}

fn register<'a>()
-> impl Parser<'a, &'a [Token], char, PError<'a>> + Clone {
    any().try_map(|token: Token, span| {
        if let Token::Word(name) = &token {
            let mut chars = name.chars();
            if let (Some(chr), None) = (chars.next(), chars.next()) {
                return Ok(chr.to_ascii_uppercase());
            }
        }
        Err(Rich::custom(span, format!("expected a register, found {token}")))
    })
}

//===========================================================================//

#[cfg(test)]
mod tests {
    use super::Command;
    use crate::sched::Which;

    fn parse(line: &str) -> Option<Command> {
        Command::parse_line(line).unwrap()
    }

    #[test]
    fn blank_lines() {
        assert_eq!(parse(""), None);
        assert_eq!(parse("  # nothing to see"), None);
    }

    #[test]
    fn step() {
        assert_eq!(
            parse("step"),
            Some(Command::Step { which: None, count: 1 })
        );
        assert_eq!(
            parse("step 10"),
            Some(Command::Step { which: None, count: 0x10 })
        );
        assert_eq!(
            parse("STEP spc 3"),
            Some(Command::Step { which: Some(Which::Spc), count: 3 })
        );
    }

    #[test]
    fn run_and_break() {
        assert_eq!(parse("run 1000"), Some(Command::Run { count: 0x1000 }));
        assert_eq!(
            parse("break cpu 008000"),
            Some(Command::Break {
                which: Which::Cpu,
                address: 0x8000,
                count: 1,
            })
        );
        assert_eq!(
            parse("break spc ffc0 3"),
            Some(Command::Break {
                which: Which::Spc,
                address: 0xffc0,
                count: 3,
            })
        );
    }

    #[test]
    fn assignments() {
        assert_eq!(
            parse("set cpu a=1234"),
            Some(Command::Set {
                which: Which::Cpu,
                register: 'A',
                value: 0x1234,
            })
        );
        assert_eq!(
            parse("write spc 00f4 = $ea"),
            Some(Command::Write {
                which: Which::Spc,
                address: 0xf4,
                value: 0xea,
            })
        );
    }

    #[test]
    fn listings() {
        assert_eq!(parse("regs"), Some(Command::Regs));
        assert_eq!(
            parse("disasm cpu"),
            Some(Command::Disasm { which: Which::Cpu, count: 8 })
        );
        assert_eq!(
            parse("disasm spc 20"),
            Some(Command::Disasm { which: Which::Spc, count: 0x20 })
        );
    }

    #[test]
    fn errors() {
        assert!(Command::parse_line("bogus").is_err());
        assert!(Command::parse_line("run").is_err());
        assert!(Command::parse_line("break ppu 2100").is_err());
        assert!(Command::parse_line("write cpu 0000=100").is_err());
        assert!(Command::parse_line("set cpu ab=1").is_err());
        assert!(Command::parse_line("regs cpu").is_err());
        assert!(Command::parse_line("run 1 ~").is_err());
    }
}

//===========================================================================//
