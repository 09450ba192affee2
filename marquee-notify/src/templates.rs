use chrono::{DateTime, Utc};

/// Dollar rendering of an integer minor-unit amount.
pub fn format_amount(amount_cents: i64) -> String {
    format!("${}.{:02}", amount_cents / 100, amount_cents % 100)
}

fn format_show_time(show_datetime: DateTime<Utc>) -> String {
    show_datetime.format("%A, %B %e %Y at %H:%M UTC").to_string()
}

/// Confirmation email sent once a booking is paid.
pub fn booking_confirmation(
    user_name: &str,
    movie_title: &str,
    show_datetime: DateTime<Utc>,
    seats: &[String],
    amount_cents: i64,
) -> (String, String) {
    let subject = format!("Payment Confirmation: \"{movie_title}\" booked!");
    let body = format!(
        r#"<h2>Booking Confirmed!</h2>
<p>Hello {user_name},</p>
<p>Your booking for <strong>{movie_title}</strong> is confirmed.</p>
<p><strong>Date &amp; Time:</strong> {show_time}</p>
<p><strong>Seats:</strong> {seat_list}</p>
<p><strong>Tickets:</strong> {ticket_count}</p>
<p><strong>Total Paid:</strong> {amount}</p>
<p>Thank you for booking with us. Enjoy your movie!</p>
<p>- The Marquee Team</p>
"#,
        show_time = format_show_time(show_datetime),
        seat_list = seats.join(", "),
        ticket_count = seats.len(),
        amount = format_amount(amount_cents),
    );
    (subject, body)
}

/// Reminder sent ahead of a show the user holds seats for.
pub fn show_reminder(
    user_name: &str,
    movie_title: &str,
    show_datetime: DateTime<Utc>,
) -> (String, String) {
    let subject = format!("Reminder: Your movie \"{movie_title}\" starts soon!");
    let body = format!(
        r#"<h2>Movie Reminder!</h2>
<p>Hi {user_name},</p>
<p>This is a quick reminder that your movie <strong>"{movie_title}"</strong> is starting soon!</p>
<p><strong>Date &amp; Time:</strong> {show_time}</p>
<p>We hope you're as excited as we are. Don't be late!</p>
<p>- The Marquee Team</p>
"#,
        show_time = format_show_time(show_datetime),
    );
    (subject, body)
}

/// Announcement sent to every user when new shows are added for a movie.
pub fn new_show_alert(user_name: &str, movie_title: &str) -> (String, String) {
    let subject = format!("New Show Added: {movie_title}");
    let body = format!(
        r#"<h2>New Show Alert!</h2>
<p>Hi {user_name},</p>
<p>We've just added a new show for <strong>"{movie_title}"</strong>!</p>
<p>Check it out now and book your seats before they fill up!</p>
<p>- The Marquee Team</p>
"#,
    );
    (subject, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn amounts_render_as_dollars() {
        assert_eq!(format_amount(3000), "$30.00");
        assert_eq!(format_amount(1205), "$12.05");
        assert_eq!(format_amount(5), "$0.05");
    }

    #[test]
    fn confirmation_lists_seats_and_total() {
        let when = Utc.with_ymd_and_hms(2026, 3, 14, 19, 30, 0).unwrap();
        let (subject, body) = booking_confirmation(
            "Ada",
            "Arrival",
            when,
            &["A1".to_string(), "A2".to_string()],
            3000,
        );

        assert!(subject.contains("Arrival"));
        assert!(body.contains("A1, A2"));
        assert!(body.contains("$30.00"));
        assert!(body.contains("Ada"));
    }

    #[test]
    fn reminder_names_the_movie() {
        let when = Utc.with_ymd_and_hms(2026, 3, 14, 19, 30, 0).unwrap();
        let (subject, body) = show_reminder("Ada", "Arrival", when);
        assert!(subject.contains("starts soon"));
        assert!(body.contains("Arrival"));
    }
}
