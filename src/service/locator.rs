// service/locator.rs
use uuid::Uuid;

use crate::db::jobdb::JobStoreExt;
use crate::models::jobmodel::{Job, JobKind, Proposal};
use crate::service::error::ServiceError;

/// A (job, proposal) pair resolved to the tables it actually lives in.
#[derive(Debug, Clone)]
pub struct Located {
    pub job: Job,
    pub proposal: Proposal,
    pub kind: JobKind,
}

/// Resolve a job and its proposal, tolerating a wrong declared kind. Records
/// were historically written through two independent flows, so either the job
/// or the proposal may sit in the table the caller did not expect. The job is
/// probed under the declared kind first and the other kind on a miss; the
/// proposal is probed under the job's resolved kind, and if it only exists
/// under the other kind, that table wins and the resolved kind flips again.
pub async fn locate<S: JobStoreExt + Sync + ?Sized>(
    store: &S,
    job_id: Uuid,
    proposal_id: Uuid,
    declared: JobKind,
) -> Result<Located, ServiceError> {
    let (job, mut kind) = match store.get_job(declared, job_id).await? {
        Some(job) => (job, declared),
        None => match store.get_job(declared.other(), job_id).await? {
            Some(job) => {
                tracing::warn!(
                    %job_id,
                    declared = declared.to_str(),
                    actual = declared.other().to_str(),
                    "job found under the other kind than declared"
                );
                (job, declared.other())
            }
            None => return Err(ServiceError::JobNotFound(job_id)),
        },
    };

    let proposal = match store.get_proposal(kind, proposal_id).await? {
        Some(proposal) => proposal,
        None => match store.get_proposal(kind.other(), proposal_id).await? {
            Some(proposal) => {
                tracing::warn!(
                    %proposal_id,
                    job_kind = kind.to_str(),
                    proposal_kind = kind.other().to_str(),
                    "proposal found under the other kind than its job; proposal table wins"
                );
                kind = kind.other();
                proposal
            }
            None => return Err(ServiceError::ProposalNotFound(proposal_id)),
        },
    };

    Ok(Located {
        job,
        proposal,
        kind,
    })
}
