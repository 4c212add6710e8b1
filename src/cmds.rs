use chrono::NaiveDate;
use std::str::FromStr;
use std::time::Duration;

use nom::{
    bytes::complete::take_while1,
    character::complete::{digit1, space0, space1},
    combinator::{all_consuming, opt, rest},
    error::{ErrorKind as NomErrorKind, ParseError},
    sequence::{delimited, preceded, tuple},
    Err, IResult,
};

use crate::app::{App, Input};
use crate::calendar::AutoAnswer;
use crate::camera::CameraError;
use crate::error::{Error, ErrorKind, Result};
use crate::render;
use crate::scroll::Granularity;
use crate::sheet::{SheetKey, TransitionTarget};
use crate::shell::{self, RecordChoice, Route, DRAWER_ITEMS};

pub type ActionResult = Result<Option<String>>;

pub enum Action {
    Arg(fn(&mut App, &str) -> ActionResult),
    NoArg(fn(&mut App) -> ActionResult),
    Repeatable(fn(&mut App, u32) -> ActionResult),
}

pub struct CommandParser<'a> {
    app: &'a mut App,
}

fn command_name(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_ascii_alphabetic() || c == '-')(input)
}

pub fn match_action<'a>(
    table: &'a [(&'static str, Action)],
) -> impl Fn(&str) -> IResult<&str, &'a (&'static str, Action)> + 'a {
    move |input| {
        let (remaining, name) = command_name(input)?;
        table
            .iter()
            .find(|(n, _)| *n == name)
            .map(|entry| (remaining, entry))
            .ok_or_else(|| Err::Failure(ParseError::from_error_kind(input, NomErrorKind::Tag)))
    }
}

fn command_line(input: &str) -> IResult<&str, (Option<&str>, &(&'static str, Action), Option<&str>)> {
    all_consuming(delimited(
        space0,
        tuple((
            opt(digit1),
            match_action(COMMANDS),
            opt(preceded(space1, rest)),
        )),
        space0,
    ))(input)
}

impl<'a> CommandParser<'a> {
    pub fn new(app: &'a mut App) -> Self {
        CommandParser { app }
    }

    pub fn run_command(&mut self, cmd: &str) -> ActionResult {
        let cmd = cmd.trim();
        if cmd.is_empty() || cmd.starts_with('#') {
            return Ok(None);
        }

        let (_, (repeat, (name, act), arg)) = command_line(cmd).map_err(|e| match e {
            Err::Failure(_) => Error::new(ErrorKind::UnknownCommand, cmd),
            e => Error::from(e),
        })?;
        let arg = arg.map(str::trim).filter(|a| !a.is_empty());

        log::debug!("command '{}'", cmd);

        match (act, repeat, arg) {
            (Action::Repeatable(a), repeat, None) => {
                let repeats = match repeat {
                    Some(digits) => u32::from_str(digits)
                        .map_err(|_| Error::new(ErrorKind::OutOfRange, digits))?,
                    None => 1,
                };
                a(self.app, repeats)
            }
            (Action::NoArg(a), None, None) => a(self.app),
            (Action::Arg(a), None, Some(arg)) => a(self.app, arg),
            (Action::Arg(_), None, None) => Err(Error::new(
                ErrorKind::CommandParse,
                &format!("'{}' expects an argument", name),
            )),
            _ => Err(Error::new(
                ErrorKind::CommandParse,
                &format!("unexpected count or argument for '{}'", name),
            )),
        }
    }
}

fn parse_route(arg: &str) -> Result<Route> {
    match arg {
        "home" => Ok(Route::Home),
        path if path.starts_with('/') => Route::from_str(path),
        name => Route::from_str(&format!("/{}", name)),
    }
}

fn parse_date(arg: &str) -> Result<NaiveDate> {
    Ok(NaiveDate::parse_from_str(arg, "%Y-%m-%d")?)
}

fn parse_number<T: FromStr>(arg: &str) -> Result<T> {
    T::from_str(arg).map_err(|_| Error::new(ErrorKind::OutOfRange, arg))
}

fn reduce(app: &mut App, action: shell::Action) -> ActionResult {
    app.reduce(action);
    Ok(None)
}

fn input(app: &mut App, input: Input) -> ActionResult {
    app.dispatch(input);
    Ok(None)
}

const COMMANDS: &[(&str, Action)] = &[
    ("go", Action::Arg(|a, arg| reduce(a, shell::Action::Navigate(parse_route(arg)?)))),
    ("back", Action::NoArg(|a| reduce(a, shell::Action::Back))),
    ("menu", Action::NoArg(|a| reduce(a, shell::Action::ToggleDrawer))),
    ("escape", Action::NoArg(|a| reduce(a, shell::Action::Escape))),
    (
        "drawer",
        Action::Arg(|a, arg| {
            let key = SheetKey::from_str(arg)?;
            if !DRAWER_ITEMS.iter().any(|item| item.sheet == key) {
                return Err(Error::new(ErrorKind::UnknownSheet, arg));
            }
            reduce(a, shell::Action::DrawerItem(key))
        }),
    ),
    (
        "open",
        Action::Arg(|a, arg| {
            let mut words = arg.split_whitespace();
            let key = SheetKey::from_str(words.next().unwrap_or_default())?;
            let closable = match words.next() {
                None => true,
                Some("fixed") => false,
                Some(other) => return Err(Error::new(ErrorKind::CommandParse, other)),
            };
            reduce(a, shell::Action::OpenSheet { key, closable })
        }),
    ),
    ("qr", Action::NoArg(|a| reduce(a, shell::Action::QrButton))),
    ("record", Action::NoArg(|a| reduce(a, shell::Action::RecordButton))),
    (
        "choose",
        Action::Arg(|a, arg| {
            let choice = match arg {
                "training" => RecordChoice::Training,
                "condition" => RecordChoice::Condition,
                "cancel" => RecordChoice::Cancel,
                other => return Err(Error::new(ErrorKind::CommandParse, other)),
            };
            reduce(a, shell::Action::RecordChoice(choice))
        }),
    ),
    ("header-back", Action::NoArg(|a| reduce(a, shell::Action::HeaderBack))),
    ("close", Action::NoArg(|a| input(a, Input::SheetCloseButton))),
    ("backdrop", Action::NoArg(|a| input(a, Input::SheetBackdrop))),
    (
        "transition-end",
        Action::NoArg(|a| input(a, Input::SheetTransitionEnd(TransitionTarget::Own))),
    ),
    (
        "nested-transition-end",
        Action::NoArg(|a| input(a, Input::SheetTransitionEnd(TransitionTarget::Nested))),
    ),
    (
        "overlay-end",
        Action::NoArg(|a| {
            reduce(
                a,
                shell::Action::OverlayTransitionEnd(TransitionTarget::Own),
            )
        }),
    ),
    ("calendar", Action::NoArg(|a| reduce(a, shell::Action::OpenCalendar))),
    ("calendar-close", Action::NoArg(|a| reduce(a, shell::Action::CloseCalendar))),
    (
        "next-month",
        Action::Repeatable(|a, n| input(a, Input::CalendarNav(i64::from(n)))),
    ),
    (
        "prev-month",
        Action::Repeatable(|a, n| input(a, Input::CalendarNav(-i64::from(n)))),
    ),
    (
        "swipe",
        Action::Arg(|a, arg| input(a, Input::CalendarScroll(parse_number(arg)?))),
    ),
    (
        "click",
        Action::Arg(|a, arg| {
            input(a, Input::CalendarDate(parse_date(arg)?))?;
            Ok(a.last_click().map(|c| format!("{:?}", c)))
        }),
    ),
    (
        "confirm",
        Action::Arg(|a, arg| {
            let answer = match arg {
                "yes" => true,
                "no" => false,
                other => return Err(Error::new(ErrorKind::CommandParse, other)),
            };
            a.set_prompt(Box::new(AutoAnswer(answer)));
            Ok(None)
        }),
    ),
    (
        "scroll",
        Action::Arg(|a, arg| input(a, Input::TimelineScroll(parse_number(arg)?))),
    ),
    (
        "view",
        Action::Arg(|a, arg| {
            let granularity = match arg {
                "day" => Granularity::Day,
                "week" => Granularity::Week,
                "month" => Granularity::Month,
                other => return Err(Error::new(ErrorKind::CommandParse, other)),
            };
            input(a, Input::TimelineGranularity(granularity))
        }),
    ),
    ("tap", Action::NoArg(|a| input(a, Input::TimelineTap))),
    (
        "camera",
        Action::Arg(|a, arg| {
            let outcome = match arg {
                "allow" => Ok(()),
                "deny" => Err(CameraError::PermissionDenied),
                "missing" => Err(CameraError::NoDevice),
                "insecure" => Err(CameraError::InsecureContext),
                other => return Err(Error::new(ErrorKind::CommandParse, other)),
            };
            a.simulate_camera(outcome);
            Ok(None)
        }),
    ),
    (
        "wait",
        Action::Arg(|a, arg| {
            a.advance(Duration::from_millis(parse_number(arg)?));
            Ok(None)
        }),
    ),
    ("show", Action::NoArg(|a| Ok(Some(render::screen(a))))),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::DayClick;
    use crate::config::Config;
    use crate::sheet::Phase;

    fn app() -> App {
        App::new(
            &Config::default(),
            NaiveDate::from_ymd_opt(2025, 11, 25).unwrap(),
        )
    }

    fn run(app: &mut App, script: &str) {
        let mut parser = CommandParser::new(app);
        for line in script.lines() {
            parser.run_command(line).unwrap();
        }
    }

    #[test]
    fn comments_and_blank_lines() {
        let mut app = app();
        let mut parser = CommandParser::new(&mut app);
        assert!(parser.run_command("").unwrap().is_none());
        assert!(parser.run_command("   # go training").unwrap().is_none());
        assert_eq!(app.shell().route(), Route::Home);
    }

    #[test]
    fn navigation() {
        let mut app = app();
        run(&mut app, "go training\ngo /stores");
        assert_eq!(app.shell().route(), Route::Stores);
        run(&mut app, "back");
        assert_eq!(app.shell().route(), Route::Training);
        run(&mut app, "go home");
        assert_eq!(app.shell().route(), Route::Home);
    }

    #[test]
    fn repeat_count() {
        let mut app = app();
        run(&mut app, "calendar\nwait 120\n3next-month");
        assert_eq!(
            app.carousel().active_month().unwrap().key(),
            "2026-02"
        );
        run(&mut app, "wait 350\n2prev-month");
        assert_eq!(
            app.carousel().active_month().unwrap().key(),
            "2025-12"
        );
    }

    #[test]
    fn fixed_sheet_and_header_back() {
        let mut app = app();
        run(&mut app, "open billing fixed\nwait 10\nclose");
        assert_eq!(app.panel().phase(), Phase::Open);
        run(&mut app, "header-back\ntransition-end");
        assert_eq!(app.panel().phase(), Phase::Closed);
        assert!(app.shell().active_sheet().is_none());
    }

    #[test]
    fn click_reports_outcome() {
        let mut app = app();
        let mut parser = CommandParser::new(&mut app);
        parser.run_command("calendar").unwrap();
        parser.run_command("confirm no").unwrap();
        let out = parser.run_command("click 2025-12-24").unwrap();
        assert_eq!(out, Some(format!("{:?}", DayClick::Declined)));
        assert!(app.carousel().planned().is_empty());
    }

    #[test]
    fn errors() {
        let mut app = app();
        let mut parser = CommandParser::new(&mut app);

        let err = parser.run_command("fly away").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::UnknownCommand));

        let err = parser.run_command("go gym").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::UnknownRoute));

        let err = parser.run_command("drawer qr").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::UnknownSheet));

        let err = parser.run_command("click 2025-13-01").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::DateParse));

        assert!(parser.run_command("go").is_err());
        assert!(parser.run_command("2menu").is_err());
        assert!(parser.run_command("next-month 3").is_err());
    }

    #[test]
    fn show_renders_screen() {
        let mut app = app();
        let mut parser = CommandParser::new(&mut app);
        let out = parser.run_command("show").unwrap().unwrap();
        assert!(out.contains("ホーム"));
    }
}
