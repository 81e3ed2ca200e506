//! HTML rendering. Pages are small enough that plain `format!` templates do
//! the job; every interpolated value goes through [`escape`].

use axum::response::Html;

use crate::identity::{Principal, Role};
use crate::storage::{DocumentRecord, StaffRecord, StudentRecord};

pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
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

fn nav(principal: Option<&Principal>) -> String {
    let Some(p) = principal else { return String::new() };
    let links: &[(&str, &str)] = match p.role {
        Role::Student => &[("/dashboard", "Dashboard"), ("/upload", "Upload"), ("/my-documents", "My documents"), ("/profile", "Profile")],
        Role::Staff => &[
            ("/dashboard", "Dashboard"),
            ("/staff/manage_students", "Students"),
            ("/staff/manage_documents", "Documents"),
            ("/profile", "Profile"),
        ],
        Role::Admin => &[
            ("/dashboard", "Dashboard"),
            ("/admin/manage_staffs", "Staff"),
            ("/admin/manage_students", "Students"),
            ("/profile", "Profile"),
        ],
    };
    let mut out = String::from("<nav>");
    for (href, label) in links {
        out.push_str(&format!("<a href=\"{href}\">{label}</a> | "));
    }
    out.push_str(&format!(
        "<span>{} ({})</span> | <a href=\"/logout\">Logout</a></nav>",
        escape(&p.email),
        p.role.label()
    ));
    out
}

fn flashes(messages: &[String]) -> String {
    if messages.is_empty() {
        return String::new();
    }
    let items: String = messages.iter().map(|m| format!("<li>{}</li>", escape(m))).collect();
    format!("<ul class=\"flash\">{items}</ul>")
}

pub fn layout(title: &str, principal: Option<&Principal>, flash: &[String], body: &str) -> Html<String> {
    Html(format!(
        "<!doctype html>\n<html><head><meta charset=\"utf-8\"><title>{title}</title></head>\n<body>\n{nav}\n<h1>{title}</h1>\n{flash}\n{body}\n</body></html>\n",
        title = escape(title),
        nav = nav(principal),
        flash = flashes(flash),
    ))
}

pub fn login(error: Option<&str>) -> Html<String> {
    let err = error.map(|e| format!("<p class=\"error\">{}</p>", escape(e))).unwrap_or_default();
    let body = format!(
        "{err}<form method=\"post\" action=\"/login\">\
         <label>Role <select name=\"role\">\
         <option value=\"student\">Student</option>\
         <option value=\"staff\">Staff</option>\
         <option value=\"admin\">Admin</option>\
         </select></label>\
         <label>Email <input type=\"text\" name=\"email\"></label>\
         <label>Password <input type=\"password\" name=\"password\"></label>\
         <button type=\"submit\">Login</button></form>"
    );
    layout("Login", None, &[], &body)
}

const CREATE_STUDENT_FORM: &str = "<h2>Create student</h2>\
    <form method=\"post\" action=\"/create_student\">\
    <input type=\"text\" name=\"email\" placeholder=\"email\">\
    <input type=\"password\" name=\"password\" placeholder=\"password\">\
    <button type=\"submit\">Create</button></form>";

pub fn student_dashboard(p: &Principal, flash: &[String], mentor: Option<&str>, document_count: usize) -> Html<String> {
    let mentor = mentor.map(escape).unwrap_or_else(|| "not assigned".to_string());
    let body = format!(
        "<p>Mentor: {mentor}</p><p>Uploaded documents: {document_count}</p>\
         <p><a href=\"/upload\">Upload a certificate</a></p>"
    );
    layout("Student dashboard", Some(p), flash, &body)
}

pub fn staff_dashboard(p: &Principal, flash: &[String], mentee_count: usize) -> Html<String> {
    let body = format!("<p>Students you mentor: {mentee_count}</p>{CREATE_STUDENT_FORM}");
    layout("Staff dashboard", Some(p), flash, &body)
}

pub fn admin_dashboard(p: &Principal, flash: &[String], staff_count: usize, student_count: usize) -> Html<String> {
    let body = format!(
        "<p>Staff: {staff_count} | Students: {student_count}</p>\
         <h2>Create staff</h2>\
         <form method=\"post\" action=\"/admin/create_staff\">\
         <input type=\"text\" name=\"email\" placeholder=\"email\">\
         <input type=\"password\" name=\"password\" placeholder=\"password\">\
         <button type=\"submit\">Create</button></form>{CREATE_STUDENT_FORM}"
    );
    layout("Admin dashboard", Some(p), flash, &body)
}

pub fn upload(p: &Principal, flash: &[String]) -> Html<String> {
    let body = "<form method=\"post\" action=\"/upload\" enctype=\"multipart/form-data\">\
        <input type=\"file\" name=\"file\">\
        <input type=\"text\" name=\"cert_type\" placeholder=\"certificate type\">\
        <button type=\"submit\">Upload</button></form>";
    layout("Upload certificate", Some(p), flash, body)
}

pub fn documents(title: &str, p: &Principal, flash: &[String], docs: &[DocumentRecord]) -> Html<String> {
    if docs.is_empty() {
        return layout(title, Some(p), flash, "<p>No documents.</p>");
    }
    let mut rows = String::new();
    for d in docs {
        rows.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            d.id,
            escape(&d.student_email),
            escape(&d.filename),
            escape(d.cert_type.as_deref().unwrap_or("")),
            d.uploaded_at.map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string()).unwrap_or_default(),
        ));
    }
    let body = format!(
        "<table><tr><th>Id</th><th>Student</th><th>File</th><th>Type</th><th>Uploaded</th></tr>{rows}</table>"
    );
    layout(title, Some(p), flash, &body)
}

pub fn staff_students(p: &Principal, flash: &[String], students: &[StudentRecord]) -> Html<String> {
    let mut rows = String::new();
    for s in students {
        let action = match s.mentor_email.as_deref() {
            None => format!(
                "<form method=\"post\" action=\"/staff/map_student/{}\"><button type=\"submit\">Map to me</button></form>",
                s.id
            ),
            Some(m) if m == p.email => format!(
                "<form method=\"post\" action=\"/staff/unmap_student/{}\"><button type=\"submit\">Unmap</button></form>",
                s.id
            ),
            Some(_) => String::new(),
        };
        rows.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            s.id,
            escape(&s.email),
            escape(s.mentor_email.as_deref().unwrap_or("")),
            action
        ));
    }
    let body = format!("<table><tr><th>Id</th><th>Email</th><th>Mentor</th><th></th></tr>{rows}</table>");
    layout("Manage students", Some(p), flash, &body)
}

pub fn admin_staff_list(p: &Principal, flash: &[String], staff: &[StaffRecord]) -> Html<String> {
    let rows: String = staff
        .iter()
        .map(|s| format!("<tr><td>{}</td><td><a href=\"/admin/staff/{}\">{}</a></td></tr>", s.id, s.id, escape(&s.email)))
        .collect();
    let body = format!("<table><tr><th>Id</th><th>Email</th></tr>{rows}</table>");
    layout("Manage staff", Some(p), flash, &body)
}

pub fn admin_student_list(p: &Principal, flash: &[String], students: &[StudentRecord]) -> Html<String> {
    let rows: String = students
        .iter()
        .map(|s| {
            format!(
                "<tr><td>{}</td><td><a href=\"/admin/student/{}\">{}</a></td><td>{}</td></tr>",
                s.id,
                s.id,
                escape(&s.email),
                escape(s.mentor_email.as_deref().unwrap_or(""))
            )
        })
        .collect();
    let body = format!("<table><tr><th>Id</th><th>Email</th><th>Mentor</th></tr>{rows}</table>");
    layout("Manage students", Some(p), flash, &body)
}

/// Edit form shared by the staff and student detail pages.
pub fn account_detail(title: &str, action: &str, p: &Principal, email: &str, extra: &str) -> Html<String> {
    let body = format!(
        "{extra}<form method=\"post\" action=\"{action}\">\
         <input type=\"hidden\" name=\"action\" value=\"update\">\
         <label>Email <input type=\"text\" name=\"email\" value=\"{email}\"></label>\
         <label>New password <input type=\"password\" name=\"password\"></label>\
         <button type=\"submit\">Save</button></form>\
         <form method=\"post\" action=\"{action}\">\
         <input type=\"hidden\" name=\"action\" value=\"delete\">\
         <button type=\"submit\">Delete</button></form>",
        action = escape(action),
        email = escape(email),
    );
    layout(title, Some(p), &[], &body)
}

pub fn profile(p: &Principal, flash: &[String], details: &[(&str, String)]) -> Html<String> {
    let mut rows = format!(
        "<tr><th>Email</th><td>{}</td></tr><tr><th>Role</th><td>{}</td></tr>",
        escape(&p.email),
        p.role.label()
    );
    for (k, v) in details {
        rows.push_str(&format!("<tr><th>{}</th><td>{}</td></tr>", escape(k), escape(v)));
    }
    layout("Profile", Some(p), flash, &format!("<table>{rows}</table>"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_html_specials() {
        assert_eq!(escape("<a href=\"x\">&'</a>"), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;&lt;/a&gt;");
    }

    #[test]
    fn login_shows_error_only_when_given() {
        assert!(!login(None).0.contains("class=\"error\""));
        assert!(login(Some("Invalid credentials")).0.contains("Invalid credentials"));
    }

    #[test]
    fn staff_students_offers_actions_by_mentor() {
        let me = Principal::new(Role::Staff, "m1@x.com");
        let students = vec![
            StudentRecord { id: 1, email: "a@x.com".into(), mentor_email: None },
            StudentRecord { id: 2, email: "b@x.com".into(), mentor_email: Some("m1@x.com".into()) },
            StudentRecord { id: 3, email: "c@x.com".into(), mentor_email: Some("m2@x.com".into()) },
        ];
        let html = staff_students(&me, &[], &students).0;
        assert!(html.contains("/staff/map_student/1"));
        assert!(html.contains("/staff/unmap_student/2"));
        assert!(!html.contains("/staff/map_student/3"));
        assert!(!html.contains("/staff/unmap_student/3"));
    }
}
