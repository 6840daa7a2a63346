use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tokio::sync::Mutex;
use tower::ServiceExt;
use tracing::{debug, info};

use crate::absence::Absence;
use crate::class::{Class, ClassId};
use crate::creds::Creds;
use crate::event::ClassregEvent;
use crate::services::untis_service::{self, RpcRequest, UntisService};
use crate::student::{Student, StudentId};
use crate::types::{DateRange, Institution};
use crate::util::{
    ABSENCES_METHOD, CLASSES_METHOD, EVENTS_METHOD, LOGOUT_METHOD, STUDENT_ELEMENT_TYPE,
    STUDENTS_METHOD,
};

/// Logs in to WebUntis and returns a client for the session.
pub async fn client(institution: Institution, creds: Creds) -> Result<Client<impl UntisService>> {
    let service = untis_service::service(institution, creds).await?;
    Ok(Client::new(service))
}

/// Session with WebUntis. Calls are issued one after the other; the service is locked for the
/// duration of each call.
#[derive(Debug)]
pub struct Client<Service> {
    service: Mutex<Service>,
}

impl<Service: UntisService> Client<Service> {
    pub fn new(service: Service) -> Self {
        Self {
            service: Mutex::new(service),
        }
    }

    async fn call<T: DeserializeOwned>(&self, request: RpcRequest) -> Result<T> {
        let method = request.method().to_owned();
        debug!(%method, "sending WebUntis request");

        let mut service = self.service.lock().await;
        let result = (&mut *service)
            .oneshot(request)
            .await
            .with_context(|| format!("WebUntis request `{method}` failed"))?;

        serde_json::from_value(result)
            .with_context(|| format!("could not parse result of `{method}`"))
    }

    #[tracing::instrument(skip(self), err)]
    pub async fn get_classes(&self) -> Result<Vec<Class>> {
        let classes: Vec<Class> = self
            .call(RpcRequest::new(CLASSES_METHOD, json!({})))
            .await?;
        info!(count = classes.len(), "got classes");
        Ok(classes)
    }

    #[tracing::instrument(skip(self), err)]
    pub async fn get_students(&self, class: &ClassId) -> Result<Vec<Student>> {
        let params = json!({ "klasseId": class });
        self.call(RpcRequest::new(STUDENTS_METHOD, params)).await
    }

    #[tracing::instrument(skip(self), err)]
    pub async fn get_absences(
        &self,
        student: &StudentId,
        window: &DateRange,
    ) -> Result<Vec<Absence>> {
        let mut params = window.rpc_params();
        params["studentId"] = json!(student);
        self.call(RpcRequest::new(ABSENCES_METHOD, params)).await
    }

    #[tracing::instrument(skip(self), err)]
    pub async fn get_events(
        &self,
        student: &StudentId,
        window: &DateRange,
    ) -> Result<Vec<ClassregEvent>> {
        let mut params = window.rpc_params();
        params["element"] = json!({ "id": student, "type": STUDENT_ELEMENT_TYPE });
        self.call(RpcRequest::new(EVENTS_METHOD, params)).await
    }

    pub async fn logout(&self) -> Result<()> {
        let _: Value = self.call(RpcRequest::new(LOGOUT_METHOD, json!({}))).await?;
        info!("logged out of WebUntis");
        Ok(())
    }
}
