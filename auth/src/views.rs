use crate::user::User;

const STYLE: &str = r#"
        * {
            box-sizing: border-box;
            margin: 0;
            padding: 0;
        }

        body {
            font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, "Helvetica Neue", Arial, sans-serif;
            background: linear-gradient(135deg, #667eea 0%, #764ba2 100%);
            min-height: 100vh;
            display: flex;
            align-items: center;
            justify-content: center;
            padding: 20px;
        }

        .container {
            background: white;
            border-radius: 16px;
            box-shadow: 0 20px 60px rgba(0, 0, 0, 0.3);
            max-width: 500px;
            width: 100%;
            padding: 40px;
        }

        .header {
            text-align: center;
            margin-bottom: 32px;
        }

        h1 {
            color: #333;
            font-size: 28px;
            margin-bottom: 8px;
        }

        p {
            color: #666;
            font-size: 14px;
            margin-bottom: 12px;
        }

        .provider-section {
            margin-bottom: 16px;
        }

        .btn {
            display: inline-flex;
            align-items: center;
            justify-content: center;
            width: 100%;
            padding: 12px 24px;
            border: none;
            border-radius: 8px;
            font-size: 16px;
            font-weight: 600;
            color: white;
            text-decoration: none;
            cursor: pointer;
            transition: transform 0.2s ease, box-shadow 0.2s ease;
        }

        .btn:hover {
            transform: translateY(-2px);
            box-shadow: 0 4px 12px rgba(0, 0, 0, 0.15);
        }

        .btn-primary { background-color: #667eea; }
        .btn-google { background-color: #4285f4; }
        .btn-facebook { background-color: #1877f2; }

        .error {
            color: #dc3545;
            background-color: #f8d7da;
            border: 1px solid #f5c6cb;
            border-radius: 8px;
            padding: 12px;
            margin-bottom: 24px;
            font-size: 14px;
        }
"#;

fn page(title: &str, body: &str) -> String {
    format!(r#"<!DOCTYPE html>
<html>
<head>
    <title>{} - SocialGate</title>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <style>{}</style>
</head>
<body>
    <div class="container">
{}
    </div>
</body>
</html>"#, title, STYLE, body)
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Fixed message for the `?error=` code set by the callback routes
fn error_message(code: &str) -> &'static str {
    match code {
        "google_auth_failed" => "Google sign-in failed. Please try again.",
        "facebook_auth_failed" => "Facebook sign-in failed. Please try again.",
        _ => "Sign-in failed. Please try again.",
    }
}

/// Login page with one button per enabled provider
pub fn login_page_html(enable_google: bool, enable_facebook: bool, error: Option<&str>) -> String {
    let mut body = String::from(r#"
        <div class="header">
            <h1>SocialGate</h1>
            <p>Sign in with an existing account</p>
        </div>
"#);

    if let Some(code) = error {
        body.push_str(&format!("        <div class=\"error\">{}</div>\n", error_message(code)));
    }

    if enable_google {
        body.push_str(r#"
        <div class="provider-section">
            <a href="/auth/google/login" class="btn btn-google">Continue with Google</a>
        </div>
"#);
    }

    if enable_facebook {
        body.push_str(r#"
        <div class="provider-section">
            <a href="/auth/facebook/login" class="btn btn-facebook">Continue with Facebook</a>
        </div>
"#);
    }

    if !enable_google && !enable_facebook {
        body.push_str("        <p>No sign-in providers are configured.</p>\n");
    }

    page("Login", &body)
}

/// Landing page for a signed-in user
pub fn home_page_html(user: &User) -> String {
    let linked: Vec<&str> = [
        user.google_id.as_ref().map(|_| "Google"),
        user.facebook_id.as_ref().map(|_| "Facebook"),
    ]
    .into_iter()
    .flatten()
    .collect();

    let body = format!(r#"
        <div class="header">
            <h1>Welcome, {}</h1>
            <p>Linked accounts: {}</p>
        </div>
        <form method="post" action="/auth/logout">
            <button type="submit" class="btn btn-primary">Logout</button>
        </form>
"#, escape_html(&user.username), if linked.is_empty() { "none".to_string() } else { linked.join(", ") });

    page("Home", &body)
}
