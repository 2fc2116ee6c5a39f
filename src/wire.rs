//! Newline-delimited JSON protocol: the surface the booking form, admin
//! panel, and chat frontend talk to. One request object per line, one reply
//! object per line.

use std::io;
use std::sync::Arc;
use std::time::Instant;

use futures::{SinkExt, StreamExt};
use serde::Serialize;
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio_util::codec::{Framed, LinesCodec};

use crate::api::Request;
use crate::engine::{ClinicError, Engine};
use crate::limits::{MAX_LINE_LEN, MAX_QUESTION_LEN};
use crate::observability;
use crate::prompt;

pub async fn process_connection(socket: TcpStream, engine: Arc<Engine>) -> io::Result<()> {
    let mut framed = Framed::new(socket, LinesCodec::new_with_max_length(MAX_LINE_LEN));
    while let Some(line) = framed.next().await {
        let line = line.map_err(io::Error::other)?;
        if line.trim().is_empty() {
            continue;
        }
        let reply = handle_line(&engine, &line).await;
        framed.send(reply.to_string()).await.map_err(io::Error::other)?;
    }
    Ok(())
}

async fn handle_line(engine: &Engine, line: &str) -> Value {
    let req = match serde_json::from_str::<Request>(line) {
        Ok(req) => req,
        Err(e) => {
            tracing::debug!("unparseable request: {e}");
            return error_reply(format!("bad request: {e}"));
        }
    };

    let label = observability::request_label(&req);
    let start = Instant::now();
    let result = execute(engine, req).await;
    let status = if result.is_ok() { "ok" } else { "error" };
    metrics::counter!(observability::REQUESTS_TOTAL, "request" => label, "status" => status)
        .increment(1);
    metrics::histogram!(observability::REQUEST_DURATION_SECONDS, "request" => label)
        .record(start.elapsed().as_secs_f64());

    match result {
        Ok(data) => json!({ "ok": true, "data": data }),
        Err(e) => {
            tracing::debug!("{label} failed: {e}");
            error_reply(e.to_string())
        }
    }
}

fn error_reply(message: String) -> Value {
    json!({ "ok": false, "error": message })
}

fn to_value<T: Serialize>(value: T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

async fn execute(engine: &Engine, req: Request) -> Result<Value, ClinicError> {
    match req {
        Request::GetClinic => Ok(to_value(engine.clinic().await)),
        Request::UpdateClinic { document } => {
            engine.update_clinic(document).await?;
            Ok(json!({ "updated": true }))
        }
        Request::AddSession { staff_id, service_id, start_time } => {
            let id = engine.add_session(staff_id, service_id, start_time).await?;
            Ok(json!({ "id": id }))
        }
        Request::RemoveSession { id } => {
            engine.remove_session(id).await?;
            Ok(json!({ "removed": id }))
        }
        Request::ListSessions => Ok(to_value(engine.sessions().await)),
        Request::ScheduledStaff { date } => {
            Ok(to_value(engine.scheduled_staff_for_day(date).await))
        }
        Request::AvailableStaff { at } => Ok(to_value(engine.available_staff(at).await)),
        Request::CreateBooking { client_name, service_id, staff_id, start_time } => {
            let booking = engine
                .create_booking(client_name, service_id, staff_id, start_time)
                .await?;
            Ok(to_value(booking))
        }
        Request::CancelBooking { id } => {
            engine.cancel_booking(id).await?;
            Ok(json!({ "cancelled": id }))
        }
        Request::ListBookings => Ok(to_value(engine.list_bookings())),
        Request::DailyReport { date } => Ok(to_value(engine.daily_report(date).await)),
        Request::ChatContext { question } => {
            let question = question.trim().to_string();
            if question.is_empty() {
                return Err(ClinicError::Validation("question is required"));
            }
            if question.len() > MAX_QUESTION_LEN {
                return Err(ClinicError::LimitExceeded("question too long"));
            }
            let state = engine.clinic().await;
            Ok(json!({ "prompt": prompt::clinic_prompt(&state, &question) }))
        }
    }
}
