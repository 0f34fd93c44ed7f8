use ctrlpanel_core::Route;

use crate::client::AppContext;
use crate::output::CASCADE_WARNING;

pub(crate) fn handle_home(ctx: &AppContext) {
    print!("{}", home_screen(ctx.session.state().is_authenticated()));
}

pub(crate) fn home_screen(authenticated: bool) -> String {
    let mut lines = vec![
        "Controller admin panel".to_string(),
        String::new(),
        "Screens:".to_string(),
    ];
    lines.extend(Route::fixed().iter().map(|route| format!("  {route}")));
    lines.push(String::new());
    lines.push(CASCADE_WARNING.to_string());
    lines.push(if authenticated {
        "Session: logged in".to_string()
    } else {
        "Session: anonymous (run `ctrlpanel login`)".to_string()
    });
    let mut screen = lines.join("\n");
    screen.push('\n');
    screen
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn home_lists_screens_and_warning() {
        let screen = home_screen(false);
        assert!(screen.contains("  /controllers"));
        assert!(screen.contains("  /statistics"));
        assert!(screen.contains(CASCADE_WARNING));
        assert!(screen.contains("anonymous"));
        assert!(home_screen(true).contains("logged in"));
    }
}
